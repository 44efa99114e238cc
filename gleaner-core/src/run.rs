use gleaner_engine::schema::ExtractionRequest;
use gleaner_engine::{AggregateResult, Extractor};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Options for configuring an extraction run
pub struct ExtractOptions {
    pub request: ExtractionRequest,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

/// Callback for reporting run progress
pub type ExtractProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Execute an extraction with the given options
/// Returns the aggregated result
pub async fn execute_extraction(
    options: ExtractOptions,
    progress_callback: Option<ExtractProgressCallback>,
    cancel_flag: Option<Arc<AtomicBool>>,
) -> Result<AggregateResult, String> {
    let ExtractOptions {
        request,
        timeout_secs,
        show_progress_bars,
    } = options;

    // Set up single progress bar for overall run progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting extraction...");
        Some(Arc::new(pb))
    } else {
        None
    };

    // Counter for tracking fetched pages
    let fetched_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: gleaner_engine::ProgressCallback = if show_progress_bars {
        let pb_clone = progress_bar.clone().unwrap();
        let count_clone = fetched_count.clone();
        Arc::new(move |_index: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            pb_clone.set_message(format!("Fetching page {}: {}", count, url));
            pb_clone.tick();
        })
    } else {
        let count_clone = fetched_count.clone();
        Arc::new(move |_index: usize, _url: String| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        })
    };

    let mut extractor =
        Extractor::with_timeout(timeout_secs).with_progress_callback(internal_progress_callback);
    if let Some(flag) = cancel_flag {
        extractor = extractor.with_cancel_flag(flag);
    }

    if let Some(ref callback) = progress_callback {
        callback(format!("Extracting from {}", request.url));
    }

    let result = extractor
        .extract(&request)
        .await
        .map_err(|e| e.to_string())?;

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        let total = fetched_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!(
            "Extraction complete! {} page(s) fetched, {} record(s)",
            total,
            result.records.len()
        ));
    }

    Ok(result)
}

use clap::ArgMatches;
use colored::Colorize;
use gleaner_core::report::{
    ReportFormat, generate_delimited_report, generate_json_report, generate_text_report,
    save_report,
};
use gleaner_core::run::{ExtractOptions, execute_extraction};
use gleaner_engine::result::ExtractionStatus;
use gleaner_engine::schema::ExtractionRequest;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Load and validate an extraction request from a JSON file
pub fn load_request_from_file(path: &PathBuf) -> Result<ExtractionRequest, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read request file {}: {}", path.display(), e))?;

    let request: ExtractionRequest = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid request JSON in {}: {}", path.display(), e))?;

    request.validate().map_err(|e| e.to_string())?;
    Ok(request)
}

/// Number of pages a request will fetch
pub fn planned_page_count(request: &ExtractionRequest) -> usize {
    if request.pagination.enabled {
        request.pagination.page_sequence().len()
    } else {
        1
    }
}

pub async fn handle_extract(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let request_path = sub_matches.get_one::<PathBuf>("request").unwrap();
    let output = sub_matches.get_one::<PathBuf>("output");
    let format_name = sub_matches.get_one::<String>("format").unwrap();
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let no_progress = sub_matches.get_flag("no-progress");

    // The value parser restricts format to known names
    let format = ReportFormat::from_str(format_name).unwrap_or(ReportFormat::Text);

    let request = match load_request_from_file(request_path) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    println!("\n⛏  Extracting from {}", request.url);
    println!("Pages: {}", planned_page_count(&request));
    println!("Timeout: {}s per page\n", timeout_secs);

    // Ctrl-C abandons remaining pages but still renders the partial result
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⚠  Interrupt received, finishing the page in flight...");
            cancel_clone.store(true, Ordering::Relaxed);
        }
    });

    let columns = request.column_order();
    let source_url = request.url.clone();

    let options = ExtractOptions {
        request,
        timeout_secs,
        show_progress_bars: !no_progress,
    };

    let result = match execute_extraction(options, None, Some(cancel_flag)).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("✗ Extraction failed: {}", e);
            std::process::exit(1);
        }
    };

    let rendered = match format {
        ReportFormat::Text => generate_text_report(&result, &source_url, &columns),
        ReportFormat::Json => match generate_json_report(&result, &source_url) {
            Ok(rendered) => rendered,
            Err(e) => {
                eprintln!("✗ Failed to render JSON report: {}", e);
                std::process::exit(1);
            }
        },
        ReportFormat::Csv | ReportFormat::Tsv => {
            generate_delimited_report(&result, &columns, &format)
        }
    };

    if let Some(path) = output {
        if let Err(e) = save_report(&rendered, path) {
            eprintln!("✗ Failed to write {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!(
            "{} Report saved to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    } else {
        print!("{}", rendered);
    }

    match result.status {
        ExtractionStatus::Success => {
            if !result.errors.is_empty() {
                eprintln!(
                    "{} {} page(s) failed; diagnostics are listed in the report",
                    "⚠".yellow().bold(),
                    result.errors.len()
                );
            }
        }
        ExtractionStatus::Error => {
            eprintln!("{} Every attempted page failed", "✗".red().bold());
            std::process::exit(1);
        }
        ExtractionStatus::NoData => {
            eprintln!("{} No pages yielded data", "⚠".yellow().bold());
            std::process::exit(2);
        }
    }
}

pub fn handle_validate(sub_matches: &ArgMatches) {
    let request_path = sub_matches.get_one::<PathBuf>("request").unwrap();

    match load_request_from_file(request_path) {
        Ok(request) => {
            println!(
                "{} {} is a valid extraction request",
                "✓".green().bold(),
                request_path.display().to_string().bright_white()
            );
            println!("  Source:    {}", request.url);
            println!(
                "  Container: {} '{}'",
                request.container.kind.as_str(),
                request.container.name
            );
            println!("  Pages:     {}", planned_page_count(&request));
            println!("  Columns:   {}", request.column_order().join(", "));
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

// Report generation from an aggregated extraction result

use gleaner_engine::result::{AggregateResult, ExtractionStatus};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Tsv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "tsv" => Some(ReportFormat::Tsv),
            _ => None,
        }
    }
}

pub fn status_label(status: ExtractionStatus) -> &'static str {
    match status {
        ExtractionStatus::Success => "Success",
        ExtractionStatus::Error => "Error",
        ExtractionStatus::NoData => "No Data",
    }
}

pub fn generate_text_report(
    result: &AggregateResult,
    source_url: &str,
    columns: &[String],
) -> String {
    let mut report = String::new();

    // Header
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                        GLEANER EXTRACTION REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Status:        {}\n", status_label(result.status)));
    report.push_str(&format!("Source:        {}\n", source_url));
    report.push_str(&format!("Records:       {}\n", result.records.len()));
    report.push_str(&format!("Failed pages:  {}\n", result.errors.len()));
    report.push_str("\n");

    if !result.records.is_empty() {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str("RECORDS\n");
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        report.push_str(&render_table(result, columns));
        report.push_str("\n");
    }

    if !result.errors.is_empty() {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str("FAILED PAGES\n");
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for (idx, diagnostic) in result.errors.iter().enumerate() {
            report.push_str(&format!("[{}] {}\n", idx + 1, diagnostic.url));
            report.push_str(&format!("    {}\n\n", diagnostic.message));
        }
    }

    // Footer
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                          End of Report\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("\nGenerated by Gleaner - declarative tabular data extraction\n\n");

    report
}

fn render_table(result: &AggregateResult, columns: &[String]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for record in &result.records {
        for (idx, column) in columns.iter().enumerate() {
            if let Some(value) = record.get(column) {
                widths[idx] = widths[idx].max(value.chars().count());
            }
        }
    }

    let mut table = String::new();

    for (idx, column) in columns.iter().enumerate() {
        if idx > 0 {
            table.push_str(" | ");
        }
        table.push_str(&pad(column, widths[idx]));
    }
    table.push('\n');

    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            table.push_str("-+-");
        }
        table.push_str(&"-".repeat(*width));
    }
    table.push('\n');

    for record in &result.records {
        for (idx, column) in columns.iter().enumerate() {
            if idx > 0 {
                table.push_str(" | ");
            }
            let value = record.get(column).map(String::as_str).unwrap_or("");
            table.push_str(&pad(value, widths[idx]));
        }
        table.push('\n');
    }

    table
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    let mut padded = value.to_string();
    padded.push_str(&" ".repeat(width.saturating_sub(len)));
    padded
}

pub fn generate_json_report(
    result: &AggregateResult,
    source_url: &str,
) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Gleaner",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "source": source_url,
            "summary": {
                "status": result.status,
                "total_records": result.records.len(),
                "failed_pages": result.errors.len()
            },
            "records": result.records,
            "errors": result.errors
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Delimited rendering of the record set: header row from the schema's
/// column order, one line per record, missing columns empty.
pub fn generate_delimited_report(
    result: &AggregateResult,
    columns: &[String],
    format: &ReportFormat,
) -> String {
    let delimiter = match format {
        ReportFormat::Tsv => '\t',
        _ => ',',
    };

    let mut out = String::new();

    let header: Vec<String> = columns
        .iter()
        .map(|c| escape_field(c, delimiter))
        .collect();
    out.push_str(&header.join(&delimiter.to_string()));
    out.push('\n');

    for record in &result.records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                let value = record.get(column).map(String::as_str).unwrap_or("");
                escape_field(value, delimiter)
            })
            .collect();
        out.push_str(&row.join(&delimiter.to_string()));
        out.push('\n');
    }

    out
}

// RFC 4180 quoting, applied for the tab delimiter too
fn escape_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

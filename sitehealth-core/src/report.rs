// Report generation from stored crawl results

use crate::data::{CrawlSummary, Database, StoredLinkResult};
use colored::Colorize;
use rusqlite::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// How many problem links the terminal and HTML renderers list in full.
const MAX_LISTED: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Terminal,
    Json,
    Html,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terminal" | "text" => Some(ReportFormat::Terminal),
            "json" => Some(ReportFormat::Json),
            "html" => Some(ReportFormat::Html),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: i64,
    pub warnings: i64,
    pub success: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub summary: CrawlSummary,
    pub severity_counts: SeverityCounts,
    pub type_counts: Vec<(String, i64)>,
    pub results: Vec<StoredLinkResult>,
}

pub fn gather_report_data(db: &Database, crawl_id: &str) -> Result<Option<ReportData>> {
    let Some(summary) = db.get_crawl_summary(crawl_id)? else {
        return Ok(None);
    };

    let mut severity_counts = SeverityCounts {
        errors: 0,
        warnings: 0,
        success: 0,
    };
    for (severity, count) in db.get_counts_by_severity(crawl_id)? {
        match severity.as_str() {
            "error" => severity_counts.errors = count,
            "warning" => severity_counts.warnings = count,
            "success" => severity_counts.success = count,
            _ => {}
        }
    }

    let type_counts = db.get_counts_by_link_type(crawl_id)?;
    let results = db.get_link_results(crawl_id, None)?;

    Ok(Some(ReportData {
        summary,
        severity_counts,
        type_counts,
        results,
    }))
}

pub fn generate_report(data: &ReportData, format: &ReportFormat) -> String {
    match format {
        ReportFormat::Terminal => generate_terminal_report(data),
        ReportFormat::Json => {
            generate_json_report(data).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        }
        ReportFormat::Html => generate_html_report(data),
    }
}

pub fn generate_terminal_report(data: &ReportData) -> String {
    let mut report = String::new();
    let summary = &data.summary;

    report.push_str(&format!("\n{}\n\n", "=== Site Health Report ===".bold()));
    report.push_str(&format!("URL:                 {}\n", summary.start_url));
    report.push_str(&format!("Status:              {}\n", summary.status));
    report.push_str(&format!("Crawl depth:         {}\n", summary.max_depth));
    report.push_str(&format!("Pages crawled:       {}\n", summary.total_pages));
    report.push_str(&format!("Total links checked: {}\n", summary.total_links));

    if let Some(completed_at) = summary.completed_at {
        report.push_str(&format!(
            "Duration:            {} seconds\n",
            completed_at - summary.started_at
        ));
    }

    report.push_str(&format!("\n{}\n", "Summary:".bold()));
    report.push_str(&format!(
        "  {}\n",
        format!("Errors:   {}", data.severity_counts.errors).red()
    ));
    report.push_str(&format!(
        "  {}\n",
        format!("Warnings: {}", data.severity_counts.warnings).yellow()
    ));
    report.push_str(&format!(
        "  {}\n",
        format!("Success:  {}", data.severity_counts.success).green()
    ));

    if !data.type_counts.is_empty() {
        report.push_str(&format!("\n{}\n", "Links by type:".bold()));
        for (link_type, count) in &data.type_counts {
            report.push_str(&format!("  {:<12} {}\n", link_type, count));
        }
    }

    let errors: Vec<&StoredLinkResult> = data
        .results
        .iter()
        .filter(|r| r.severity == "error")
        .collect();
    if !errors.is_empty() {
        report.push_str(&format!("\n{}\n", "=== Errors ===".red().bold()));
        for result in errors.iter().take(MAX_LISTED) {
            report.push_str(&format!("\n{} {}\n", "x".red(), result.target_url));
            report.push_str(&format!("  Source: {}\n", result.source_url));
            report.push_str(&format!("  Type:   {}\n", result.link_type));
            if let Some(status) = result.status_code {
                report.push_str(&format!("  Status: {}\n", status));
            }
            if let Some(ref message) = result.error_message {
                report.push_str(&format!("  Error:  {}\n", message));
            }
        }
        if errors.len() > MAX_LISTED {
            report.push_str(&format!("\n... and {} more errors\n", errors.len() - MAX_LISTED));
        }
    }

    let warnings: Vec<&StoredLinkResult> = data
        .results
        .iter()
        .filter(|r| r.severity == "warning")
        .collect();
    if !warnings.is_empty() {
        report.push_str(&format!("\n{}\n", "=== Warnings ===".yellow().bold()));
        for result in warnings.iter().take(MAX_LISTED) {
            report.push_str(&format!("\n{} {}\n", "!".yellow(), result.target_url));
            report.push_str(&format!("  Source: {}\n", result.source_url));
            report.push_str(&format!("  Type:   {}\n", result.link_type));
            if let Some(status) = result.status_code {
                report.push_str(&format!("  Status: {}\n", status));
            }
            if let Some(ref final_url) = result.final_url {
                report.push_str(&format!("  Final:  {}\n", final_url));
            }
            if result.response_time_ms > 5000 {
                report.push_str(&format!("  Slow:   {} ms\n", result.response_time_ms));
            }
        }
        if warnings.len() > MAX_LISTED {
            report.push_str(&format!(
                "\n... and {} more warnings\n",
                warnings.len() - MAX_LISTED
            ));
        }
    }

    report.push('\n');
    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let link_types: serde_json::Map<String, serde_json::Value> = data
        .type_counts
        .iter()
        .map(|(link_type, count)| (link_type.clone(), serde_json::json!(count)))
        .collect();

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "sitehealth",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "crawl": {
                "id": data.summary.id,
                "start_url": data.summary.start_url,
                "status": data.summary.status,
                "max_depth": data.summary.max_depth,
                "started_at": format_iso8601_timestamp(data.summary.started_at),
                "completed_at": data.summary.completed_at.map(format_iso8601_timestamp),
                "duration_seconds": data.summary.completed_at.map(|end| end - data.summary.started_at)
            },
            "summary": {
                "total_pages": data.summary.total_pages,
                "total_links": data.summary.total_links,
                "severity_breakdown": {
                    "errors": data.severity_counts.errors,
                    "warnings": data.severity_counts.warnings,
                    "success": data.severity_counts.success
                },
                "link_types": link_types
            },
            "results": data.results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_html_report(data: &ReportData) -> String {
    let summary = &data.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Site Health Report - {}</title>\n",
        html_escape(&summary.start_url)
    ));
    html.push_str(
        "<style>
body { font-family: sans-serif; margin: 2em; color: #222; }
h1 { border-bottom: 2px solid #ddd; padding-bottom: 0.3em; }
.cards { display: flex; gap: 1em; margin: 1em 0; }
.card { border: 1px solid #ddd; border-radius: 6px; padding: 1em 2em; text-align: center; }
.card .count { font-size: 2em; font-weight: bold; }
.error .count { color: #c0392b; }
.warning .count { color: #b8860b; }
.success .count { color: #1e8449; }
table { border-collapse: collapse; width: 100%; margin-top: 1em; }
th, td { border: 1px solid #ddd; padding: 0.4em 0.8em; text-align: left; }
th { background: #f5f5f5; }
tr.error td.severity { color: #c0392b; }
tr.warning td.severity { color: #b8860b; }
</style>\n</head>\n<body>\n",
    );

    html.push_str("<h1>Site Health Report</h1>\n");
    html.push_str(&format!(
        "<p>URL: <strong>{}</strong><br>Status: {}<br>Depth: {}<br>Pages crawled: {}<br>Links checked: {}</p>\n",
        html_escape(&summary.start_url),
        html_escape(&summary.status),
        summary.max_depth,
        summary.total_pages,
        summary.total_links
    ));

    html.push_str("<div class=\"cards\">\n");
    html.push_str(&format!(
        "<div class=\"card error\"><div class=\"count\">{}</div>Errors</div>\n",
        data.severity_counts.errors
    ));
    html.push_str(&format!(
        "<div class=\"card warning\"><div class=\"count\">{}</div>Warnings</div>\n",
        data.severity_counts.warnings
    ));
    html.push_str(&format!(
        "<div class=\"card success\"><div class=\"count\">{}</div>Success</div>\n",
        data.severity_counts.success
    ));
    html.push_str("</div>\n");

    let problems: Vec<&StoredLinkResult> = data
        .results
        .iter()
        .filter(|r| r.severity != "success")
        .collect();

    if !problems.is_empty() {
        html.push_str("<h2>Problem links</h2>\n<table>\n");
        html.push_str(
            "<tr><th>Severity</th><th>Target</th><th>Source</th><th>Type</th><th>Status</th><th>Detail</th></tr>\n",
        );
        for result in &problems {
            let status = result
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            let detail = result
                .error_message
                .as_deref()
                .or(result.final_url.as_deref())
                .unwrap_or("");
            html.push_str(&format!(
                "<tr class=\"{}\"><td class=\"severity\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                result.severity,
                result.severity,
                html_escape(&result.target_url),
                html_escape(&result.source_url),
                result.link_type,
                status,
                html_escape(detail)
            ));
        }
        html.push_str("</table>\n");
    } else {
        html.push_str("<p>No broken or degraded links found.</p>\n");
    }

    html.push_str(&format!(
        "<p><small>Generated by sitehealth v{} at {}</small></p>\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</body>\n</html>\n");

    html
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_iso8601_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.to_rfc3339()
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

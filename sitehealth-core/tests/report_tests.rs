// Tests for report generation

use sitehealth_core::data::Database;
use sitehealth_core::report::{
    ReportFormat, gather_report_data, generate_html_report, generate_json_report,
    generate_terminal_report, save_report,
};
use sitehealth_crawler::{LinkResult, LinkType, Severity};
use std::time::Duration;
use tempfile::TempDir;

fn seeded_db() -> (TempDir, Database, String) {
    let temp_dir = TempDir::new().unwrap();
    let mut db = Database::new(&temp_dir.path().join("test.db")).unwrap();
    let crawl_id = db.create_crawl("https://a.test/", 2).unwrap();

    let results = vec![
        LinkResult {
            source_url: "https://a.test/".to_string(),
            target_url: "https://a.test/contact".to_string(),
            link_type: LinkType::Page,
            status_code: Some(200),
            response_time: Duration::from_millis(90),
            severity: Severity::Success,
            error_message: None,
            final_url: None,
        },
        LinkResult {
            source_url: "https://a.test/".to_string(),
            target_url: "https://a.test/missing".to_string(),
            link_type: LinkType::Page,
            status_code: Some(404),
            response_time: Duration::from_millis(45),
            severity: Severity::Error,
            error_message: Some("HTTP 404".to_string()),
            final_url: None,
        },
        LinkResult {
            source_url: "https://a.test/about".to_string(),
            target_url: "https://a.test/old".to_string(),
            link_type: LinkType::Page,
            status_code: Some(200),
            response_time: Duration::from_millis(130),
            severity: Severity::Warning,
            error_message: None,
            final_url: Some("https://a.test/new".to_string()),
        },
    ];
    db.save_link_results(&crawl_id, &results).unwrap();
    db.complete_crawl(&crawl_id, 2, results.len()).unwrap();

    (temp_dir, db, crawl_id)
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(
        ReportFormat::from_str("terminal"),
        Some(ReportFormat::Terminal)
    ));
    assert!(matches!(
        ReportFormat::from_str("TEXT"),
        Some(ReportFormat::Terminal)
    ));
    assert!(matches!(ReportFormat::from_str("json"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("Html"), Some(ReportFormat::Html)));
    assert!(ReportFormat::from_str("pdf").is_none());
}

// ============================================================================
// Data Gathering Tests
// ============================================================================

#[test]
fn test_gather_report_data() {
    let (_temp_dir, db, crawl_id) = seeded_db();

    let data = gather_report_data(&db, &crawl_id).unwrap().unwrap();
    assert_eq!(data.summary.start_url, "https://a.test/");
    assert_eq!(data.summary.total_pages, 2);
    assert_eq!(data.severity_counts.errors, 1);
    assert_eq!(data.severity_counts.warnings, 1);
    assert_eq!(data.severity_counts.success, 1);
    assert_eq!(data.results.len(), 3);
}

#[test]
fn test_gather_report_data_unknown_crawl() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();

    assert!(gather_report_data(&db, "missing").unwrap().is_none());
}

// ============================================================================
// Renderer Tests
// ============================================================================

#[test]
fn test_terminal_report_contents() {
    let (_temp_dir, db, crawl_id) = seeded_db();
    let data = gather_report_data(&db, &crawl_id).unwrap().unwrap();

    let report = generate_terminal_report(&data);
    assert!(report.contains("Site Health Report"));
    assert!(report.contains("https://a.test/"));
    assert!(report.contains("Errors:   1"));
    assert!(report.contains("Warnings: 1"));
    assert!(report.contains("https://a.test/missing"));
    assert!(report.contains("HTTP 404"));
    // Redirect warnings list the post-redirect URL.
    assert!(report.contains("https://a.test/new"));
}

#[test]
fn test_json_report_structure() {
    let (_temp_dir, db, crawl_id) = seeded_db();
    let data = gather_report_data(&db, &crawl_id).unwrap().unwrap();

    let json = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["metadata"]["generator"], "sitehealth");
    assert_eq!(report["crawl"]["start_url"], "https://a.test/");
    assert_eq!(report["crawl"]["status"], "completed");
    assert_eq!(report["summary"]["severity_breakdown"]["errors"], 1);
    assert_eq!(report["summary"]["link_types"]["page"], 3);
    assert_eq!(report["results"].as_array().unwrap().len(), 3);
}

#[test]
fn test_html_report_contents() {
    let (_temp_dir, db, crawl_id) = seeded_db();
    let data = gather_report_data(&db, &crawl_id).unwrap().unwrap();

    let html = generate_html_report(&data);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Site Health Report"));
    assert!(html.contains("https://a.test/missing"));
    assert!(html.contains("https://a.test/old"));
    // Healthy links stay out of the problem table.
    assert!(!html.contains("https://a.test/contact"));
}

#[test]
fn test_html_report_escapes_markup() {
    let (_temp_dir, mut db, crawl_id) = {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
        let id = db.create_crawl("https://a.test/", 1).unwrap();
        (temp_dir, db, id)
    };

    db.save_link_results(
        &crawl_id,
        &[LinkResult {
            source_url: "https://a.test/".to_string(),
            target_url: "https://a.test/q?x=<script>".to_string(),
            link_type: LinkType::Page,
            status_code: Some(404),
            response_time: Duration::from_millis(10),
            severity: Severity::Error,
            error_message: Some("HTTP 404".to_string()),
            final_url: None,
        }],
    )
    .unwrap();

    let data = gather_report_data(&db, &crawl_id).unwrap().unwrap();
    let html = generate_html_report(&data);
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("x=<script>"));
}

#[test]
fn test_save_report_writes_file() {
    let (_temp_dir, db, crawl_id) = seeded_db();
    let data = gather_report_data(&db, &crawl_id).unwrap().unwrap();

    let out_dir = TempDir::new().unwrap();
    let out_path = out_dir.path().join("report.html");
    save_report(&generate_html_report(&data), &out_path).unwrap();

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.contains("Site Health Report"));
}

use crate::config::Config;
use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use sitehealth_core::data::Database;
use sitehealth_core::report::{self, ReportFormat};
use sitehealth_crawler::SiteCrawler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

/// Expand `~` in a user-supplied database path.
pub fn resolve_db_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.as_ref())
}

/// Run a crawl end to end: create the session row, drive the crawler with a
/// progress spinner, persist the results and render the report.
pub async fn run_crawl(config: &Config, db_path: &Path, quiet: bool) -> Result<()> {
    let Some(url) = config.url.as_deref() else {
        bail!("URL is required (provide via argument or config file)");
    };

    let mut db = Database::new(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    let crawl_id = db
        .create_crawl(url, config.depth)
        .context("Failed to create crawl session")?;
    info!("Created crawl session {}", crawl_id);

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Crawling {}...", url));
        Some(pb)
    };

    let mut crawler = SiteCrawler::new(url)?
        .with_max_depth(config.depth)
        .with_max_concurrent(config.max_concurrent)
        .with_timeout(Duration::from_secs_f64(config.timeout))
        .with_respect_robots(config.respect_robots);

    if let Some(pb) = spinner.clone() {
        let processed = Arc::new(AtomicUsize::new(0));
        crawler = crawler.with_progress_callback(Arc::new(move |page: String| {
            let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("Crawling... {} pages processed ({})", count, page));
        }));
    }

    let outcome = match crawler.crawl().await {
        Ok(outcome) => outcome,
        Err(e) => {
            let _ = db.fail_crawl(&crawl_id);
            if let Some(pb) = &spinner {
                pb.finish_and_clear();
            }
            return Err(e).context("Crawl failed");
        }
    };

    db.save_link_results(&crawl_id, &outcome.results)
        .context("Failed to save crawl results")?;
    db.complete_crawl(&crawl_id, outcome.pages_crawled, outcome.results.len())
        .context("Failed to mark crawl complete")?;

    if let Some(pb) = &spinner {
        pb.finish_with_message(format!(
            "Crawl complete! Pages crawled: {}, links checked: {}",
            outcome.pages_crawled,
            outcome.results.len()
        ));
    }

    render_report(
        &db,
        &crawl_id,
        &config.output_format,
        config.output_path.as_deref(),
    )
}

/// Render a stored crawl in the requested format, to stdout or to a file.
pub fn render_report(
    db: &Database,
    crawl_id: &str,
    format: &str,
    output_path: Option<&str>,
) -> Result<()> {
    let format = ReportFormat::from_str(format)
        .with_context(|| format!("Unknown report format: {}", format))?;

    let data = report::gather_report_data(db, crawl_id)
        .context("Failed to read crawl results")?
        .with_context(|| format!("Crawl not found: {}", crawl_id))?;

    let rendered = report::generate_report(&data, &format);

    match output_path {
        Some(path) => {
            report::save_report(&rendered, Path::new(path))
                .with_context(|| format!("Failed to write report to {}", path))?;
            println!("Report saved to: {}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Pick the crawl to report on: an explicit id, or the most recent run.
pub fn resolve_crawl_id(db: &Database, requested: Option<&str>) -> Result<String> {
    match requested {
        Some(id) => Ok(id.to_string()),
        None => db
            .latest_crawl_id()
            .context("Failed to query crawl history")?
            .context("No crawls recorded yet - run `sitehealth crawl` first"),
    }
}

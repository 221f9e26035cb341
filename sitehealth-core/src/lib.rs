pub mod data;
pub mod report;

pub use data::{CrawlSummary, Database, StoredLinkResult};
pub use report::{ReportData, ReportFormat};

pub fn print_banner() {
    println!(
        "sitehealth v{} - crawl a website and check for broken links",
        env!("CARGO_PKG_VERSION")
    );
}

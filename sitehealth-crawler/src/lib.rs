pub mod check;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod result;
pub mod robots;
pub mod sample;
pub mod url_tools;

pub use crawler::{CancellationHandle, CrawlTarget, ProgressCallback, SiteCrawler};
pub use error::CrawlError;
pub use result::{CrawlOutcome, LinkResult, LinkType, Severity};
pub use robots::{AllowAll, RobotsPolicy, RobotsRules};

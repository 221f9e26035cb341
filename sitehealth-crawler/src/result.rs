use crate::url_tools::authority;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// A response slower than this is degraded even when the status is fine.
pub const SLOW_RESPONSE_THRESHOLD: Duration = Duration::from_secs(5);

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Success => "success",
        }
    }

    /// Map a check outcome to a severity. Total over every combination of
    /// final status, elapsed time and observed redirect; transport failures
    /// are the `None` status case.
    pub fn classify(status_code: Option<u16>, elapsed: Duration, redirected: bool) -> Self {
        match status_code {
            None => Severity::Error,
            Some(code) if code >= 400 => Severity::Error,
            Some(code) if (300..400).contains(&code) || redirected => Severity::Warning,
            Some(_) if elapsed > SLOW_RESPONSE_THRESHOLD => Severity::Warning,
            Some(_) => Severity::Success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Page,
    Image,
    Stylesheet,
    Script,
    External,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Page => "page",
            LinkType::Image => "image",
            LinkType::Stylesheet => "stylesheet",
            LinkType::Script => "script",
            LinkType::External => "external",
        }
    }

    /// Classify a URL relative to the crawl origin. Asset extensions win over
    /// the domain comparison, so an off-domain image stays an image.
    pub fn classify(url: &Url, origin: &str) -> Self {
        let extension = path_extension(url);

        if let Some(ext) = extension.as_deref() {
            if IMAGE_EXTENSIONS.contains(&ext) {
                return LinkType::Image;
            }
            if ext == "css" {
                return LinkType::Stylesheet;
            }
            if ext == "js" {
                return LinkType::Script;
            }
        }

        if authority(url) != origin {
            LinkType::External
        } else {
            LinkType::Page
        }
    }
}

/// Lowercased extension of the last path segment, query string ignored.
fn path_extension(url: &Url) -> Option<String> {
    let last_segment = url.path().rsplit('/').next()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Outcome of checking one link found on one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResult {
    pub source_url: String,
    pub target_url: String,
    pub link_type: LinkType,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub severity: Severity,
    pub error_message: Option<String>,
    /// Post-redirect URL when the target answered through a redirect chain.
    pub final_url: Option<String>,
}

impl LinkResult {
    pub fn is_broken(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// What a finished crawl hands back to callers.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub results: Vec<LinkResult>,
    pub pages_crawled: usize,
}

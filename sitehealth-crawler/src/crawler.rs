use crate::check::{LinkChecker, classify_transport_error};
use crate::error::{CrawlError, Result};
use crate::extract::extract_links;
use crate::result::{CrawlOutcome, LinkResult, LinkType, Severity};
use crate::robots::{AllowAll, RobotsPolicy, RobotsRules};
use crate::sample::select_stratified_sample;
use crate::url_tools::is_same_domain;
use futures::future::join_all;
use reqwest::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

const MAX_REDIRECT_HOPS: usize = 10;

/// A pending unit of work in the frontier.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    pub url: String,
    pub depth: usize,
}

/// Requests that a running crawl stop scheduling new work. The crawl then
/// returns whatever results it has collected as a normal completion.
#[derive(Clone)]
pub struct CancellationHandle {
    flag: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct PageOutcome {
    results: Vec<LinkResult>,
    fetched: bool,
}

/// Breadth-first crawler over one site. Pages are fetched at most once per
/// run; every link found on a fetched page is checked. All HTTP operations
/// share one semaphore, so at most `max_concurrent` are in flight at any
/// instant.
pub struct SiteCrawler {
    start_url: Url,
    origin: String,
    max_depth: usize,
    max_concurrent: usize,
    timeout: Duration,
    respect_robots: bool,
    progress_callback: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
    // URL -> depth of every page enqueued for fetching, kept for the
    // sampling and page-list accessors after the run.
    visited_pages: HashMap<String, usize>,
}

impl SiteCrawler {
    /// Validates the seed URL. An unparseable or host-less seed is a setup
    /// error, distinct from any per-link failure.
    pub fn new(start_url: &str) -> Result<Self> {
        let mut seed = Url::parse(start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        if seed.host_str().is_none() {
            return Err(CrawlError::InvalidUrl(format!(
                "{}: missing host",
                start_url
            )));
        }
        seed.set_fragment(None);
        let origin = crate::url_tools::authority(&seed);

        Ok(Self {
            start_url: seed,
            origin,
            max_depth: 2,
            max_concurrent: 10,
            timeout: Duration::from_secs(10),
            respect_robots: true,
            progress_callback: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            visited_pages: HashMap::new(),
        })
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_respect_robots(mut self, respect_robots: bool) -> Self {
        self.respect_robots = respect_robots;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            flag: self.cancelled.clone(),
        }
    }

    pub fn start_url(&self) -> &str {
        self.start_url.as_str()
    }

    /// Run the crawl to completion (or cancellation). The only fatal errors
    /// are setup failures; broken links and unreachable pages come back as
    /// `error`-severity results.
    pub async fn crawl(&mut self) -> Result<CrawlOutcome> {
        info!(
            "Starting crawl of {} (depth {}, {} concurrent)",
            self.start_url, self.max_depth, self.max_concurrent
        );

        let client = Client::builder()
            .user_agent(concat!("sitehealth/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .connect_timeout(self.timeout / 2)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
            .build()?;

        let robots: Box<dyn RobotsPolicy> = if self.respect_robots {
            Box::new(RobotsRules::fetch(&client, &self.start_url).await)
        } else {
            Box::new(AllowAll)
        };

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let checker = LinkChecker::new(client.clone(), self.origin.clone(), semaphore.clone());

        self.visited_pages.clear();
        self.visited_pages.insert(self.start_url.to_string(), 0);

        let mut frontier: VecDeque<CrawlTarget> = VecDeque::new();
        frontier.push_back(CrawlTarget {
            url: self.start_url.to_string(),
            depth: 0,
        });

        let mut results: Vec<LinkResult> = Vec::new();
        let mut pages_crawled = 0usize;

        // Depths in the frontier are monotonic, so the run of equal depths
        // at the front is the whole stratum. Each stratum is one concurrent
        // batch; the visited set is only written between batches.
        while let Some(depth) = frontier.front().map(|t| t.depth) {
            if self.cancelled.load(Ordering::Relaxed) {
                info!(
                    "Cancellation requested, stopping with {} results collected",
                    results.len()
                );
                break;
            }

            let mut batch = Vec::new();
            while frontier.front().is_some_and(|t| t.depth == depth) {
                if let Some(target) = frontier.pop_front() {
                    batch.push(target);
                }
            }
            debug!("Processing {} pages at depth {}", batch.len(), depth);

            let outcomes = join_all(
                batch
                    .iter()
                    .map(|t| self.process_target(&client, &checker, &semaphore, robots.as_ref(), t)),
            )
            .await;

            for outcome in outcomes {
                pages_crawled += usize::from(outcome.fetched);

                for result in &outcome.results {
                    if result.link_type == LinkType::Page
                        && result.severity != Severity::Error
                        && depth < self.max_depth
                        && !self.visited_pages.contains_key(&result.target_url)
                    {
                        let allowed = Url::parse(&result.target_url)
                            .map(|u| robots.is_allowed(&u))
                            .unwrap_or(false);
                        if !allowed {
                            debug!("robots.txt excludes {}, not enqueueing", result.target_url);
                            continue;
                        }
                        self.visited_pages
                            .insert(result.target_url.clone(), depth + 1);
                        frontier.push_back(CrawlTarget {
                            url: result.target_url.clone(),
                            depth: depth + 1,
                        });
                    }
                }
                results.extend(outcome.results);
            }
        }

        info!(
            "Crawl complete: {} pages fetched, {} links checked",
            pages_crawled,
            results.len()
        );

        Ok(CrawlOutcome {
            results,
            pages_crawled,
        })
    }

    /// Handle one frontier entry: check-only for off-domain targets, robots
    /// gate, page fetch, link extraction and concurrent checking. Candidate
    /// pages are returned through the results; the caller owns enqueueing.
    async fn process_target(
        &self,
        client: &Client,
        checker: &LinkChecker,
        semaphore: &Arc<Semaphore>,
        robots: &dyn RobotsPolicy,
        target: &CrawlTarget,
    ) -> PageOutcome {
        if let Some(callback) = &self.progress_callback {
            callback(target.url.clone());
        }

        let Ok(url) = Url::parse(&target.url) else {
            warn!("Skipping unparseable frontier URL {}", target.url);
            return PageOutcome::default();
        };

        if !is_same_domain(&url, &self.origin) {
            // Off-domain entries are validated but never fetched as pages.
            let result = checker.check(&target.url, &target.url).await;
            return PageOutcome {
                results: vec![result],
                fetched: false,
            };
        }

        // Normally enforced at enqueue time; this only fires for the seed.
        if !robots.is_allowed(&url) {
            debug!("robots.txt excludes {}, skipping fetch", target.url);
            return PageOutcome::default();
        }

        let body = match self.fetch_page(client, semaphore, &target.url).await {
            Ok(body) => body,
            Err(result) => {
                return PageOutcome {
                    results: vec![result],
                    fetched: false,
                };
            }
        };

        let mut results = Vec::new();
        if let Some(body) = body {
            let links = extract_links(&body, &url);
            debug!("Extracted {} links from {}", links.len(), target.url);

            let checks: Vec<_> = links
                .iter()
                .map(|link| checker.check(&target.url, link))
                .collect();
            results.extend(join_all(checks).await);
        }

        PageOutcome {
            results,
            fetched: true,
        }
    }

    /// GET the page body under a semaphore permit. `Ok(None)` is a healthy
    /// non-HTML response; a failed page becomes the single error result that
    /// stands in for it.
    async fn fetch_page(
        &self,
        client: &Client,
        semaphore: &Arc<Semaphore>,
        url: &str,
    ) -> std::result::Result<Option<String>, LinkResult> {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Err(page_error(url, None, Duration::ZERO, "request failed")),
        };

        let started = Instant::now();
        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = classify_transport_error(&e);
                warn!("Failed to fetch {}: {}", url, message);
                return Err(page_error(url, None, started.elapsed(), message));
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(page_error(
                url,
                Some(status),
                started.elapsed(),
                &format!("HTTP {}", status),
            ));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        if !is_html {
            return Ok(None);
        }

        match response.text().await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                let message = classify_transport_error(&e);
                warn!("Failed to read body of {}: {}", url, message);
                Err(page_error(url, Some(status), started.elapsed(), message))
            }
        }
    }

    /// Every same-domain page URL that was enqueued for fetching this run.
    /// Input for downstream page-level analysis.
    pub fn crawled_pages(&self) -> Vec<String> {
        let mut pages: Vec<String> = self
            .visited_pages
            .keys()
            .filter(|url| {
                Url::parse(url)
                    .map(|u| LinkType::classify(&u, &self.origin) == LinkType::Page)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        pages.sort();
        pages
    }

    /// Stratified sample of crawled pages for expensive downstream
    /// measurement: homepage and depth-1 pages always, random remainder up
    /// to `sample_rate` of the total.
    pub fn pages_for_sampling(&self, sample_rate: f64) -> Vec<String> {
        let pages: Vec<(String, usize)> = self
            .visited_pages
            .iter()
            .filter(|(url, _)| {
                Url::parse(url)
                    .map(|u| LinkType::classify(&u, &self.origin) == LinkType::Page)
                    .unwrap_or(false)
            })
            .map(|(url, depth)| (url.clone(), *depth))
            .collect();
        select_stratified_sample(&pages, self.start_url.as_str(), sample_rate)
    }
}

/// The single result recorded when a same-domain page cannot be fetched.
fn page_error(
    url: &str,
    status_code: Option<u16>,
    elapsed: Duration,
    message: &str,
) -> LinkResult {
    LinkResult {
        source_url: url.to_string(),
        target_url: url.to_string(),
        link_type: LinkType::Page,
        status_code,
        response_time: elapsed,
        severity: Severity::Error,
        error_message: Some(message.to_string()),
        final_url: None,
    }
}

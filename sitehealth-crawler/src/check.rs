use crate::result::{LinkResult, LinkType, Severity};
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

/// Attempts per check when the target keeps answering 429.
const MAX_ATTEMPTS: u32 = 3;
/// First 429 backoff; doubles on each retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Performs single link checks against the shared client, with every HTTP
/// operation gated by the crawl-wide semaphore.
pub struct LinkChecker {
    client: Client,
    origin: String,
    semaphore: Arc<Semaphore>,
}

impl LinkChecker {
    pub fn new(client: Client, origin: String, semaphore: Arc<Semaphore>) -> Self {
        Self {
            client,
            origin,
            semaphore,
        }
    }

    /// Check one link found on `source_url`. Never fails: transport errors
    /// are folded into the returned result, and the permit is held for the
    /// whole attempt sequence so retries cost no extra concurrency slots.
    pub async fn check(&self, source_url: &str, target_url: &str) -> LinkResult {
        let Ok(parsed_target) = Url::parse(target_url) else {
            return LinkResult {
                source_url: source_url.to_string(),
                target_url: target_url.to_string(),
                link_type: LinkType::External,
                status_code: None,
                response_time: Duration::ZERO,
                severity: Severity::Error,
                error_message: Some("invalid url".to_string()),
                final_url: None,
            };
        };
        let link_type = LinkType::classify(&parsed_target, &self.origin);

        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                // The semaphore only closes when the crawl is torn down.
                return self.error_result(source_url, target_url, link_type, Duration::ZERO, "request failed");
            }
        };

        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            match self.probe(target_url).await {
                Ok(response) => {
                    let elapsed = started.elapsed();
                    if response.status().as_u16() == 429 && attempt < MAX_ATTEMPTS {
                        debug!(
                            "429 from {} (attempt {}/{}), backing off {:?}",
                            target_url, attempt, MAX_ATTEMPTS, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        attempt += 1;
                        continue;
                    }
                    return self.success_result(
                        source_url,
                        target_url,
                        &parsed_target,
                        link_type,
                        response,
                        elapsed,
                    );
                }
                Err(err) => {
                    let elapsed = started.elapsed();
                    let message = classify_transport_error(&err);
                    debug!("Check failed for {}: {}", target_url, message);
                    return self.error_result(source_url, target_url, link_type, elapsed, message);
                }
            }
        }
    }

    /// HEAD probe with a GET fallback for targets that reject HEAD.
    async fn probe(&self, target_url: &str) -> Result<Response, reqwest::Error> {
        let response = self.client.head(target_url).send().await?;
        if matches!(response.status().as_u16(), 405 | 501) {
            debug!("{} rejects HEAD, retrying with GET", target_url);
            return self.client.get(target_url).send().await;
        }
        Ok(response)
    }

    fn success_result(
        &self,
        source_url: &str,
        target_url: &str,
        parsed_target: &Url,
        link_type: LinkType,
        response: Response,
        elapsed: Duration,
    ) -> LinkResult {
        let status = response.status().as_u16();
        // The client follows redirects internally; a different final URL is
        // the observable trace of the chain.
        let redirected = response.url() != parsed_target;
        let final_url = redirected.then(|| response.url().to_string());
        let severity = Severity::classify(Some(status), elapsed, redirected);

        if severity == Severity::Error {
            warn!("Broken link {} -> {} (HTTP {})", source_url, target_url, status);
        }

        LinkResult {
            source_url: source_url.to_string(),
            target_url: target_url.to_string(),
            link_type,
            status_code: Some(status),
            response_time: elapsed,
            severity,
            error_message: (status >= 400).then(|| format!("HTTP {}", status)),
            final_url,
        }
    }

    fn error_result(
        &self,
        source_url: &str,
        target_url: &str,
        link_type: LinkType,
        elapsed: Duration,
        message: &str,
    ) -> LinkResult {
        LinkResult {
            source_url: source_url.to_string(),
            target_url: target_url.to_string(),
            link_type,
            status_code: None,
            response_time: elapsed,
            severity: Severity::classify(None, elapsed, false),
            error_message: Some(message.to_string()),
            final_url: None,
        }
    }
}

/// Map a transport failure to a short, stable label. Raw error text varies
/// between runs and platforms, so it never reaches the results.
pub fn classify_transport_error(error: &reqwest::Error) -> &'static str {
    let text = error.to_string();

    if error.is_timeout() {
        "timeout"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_connect() {
        if text.contains("dns") {
            "dns failure"
        } else {
            "connection refused"
        }
    } else if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
        "tls error"
    } else {
        "request failed"
    }
}

use tracing::debug;
use url::Url;

/// Schemes that can never be fetched over HTTP. References using them are
/// dropped during extraction rather than checked.
const SKIPPED_SCHEMES: &[&str] = &["javascript", "mailto", "tel", "data", "ftp"];

/// Resolve `href` against `base`, collapse relative segments, and strip the
/// fragment. Returns the canonical absolute URL string used as the crawl's
/// deduplication key, or `None` for malformed or non-fetchable references.
pub fn normalize_url(href: &str, base: &Url) -> Option<String> {
    let trimmed = href.trim();

    // An empty href is a self-link to the base page.
    let mut resolved = match base.join(trimmed) {
        Ok(url) => url,
        Err(e) => {
            debug!("Dropping malformed href {:?}: {}", href, e);
            return None;
        }
    };

    if SKIPPED_SCHEMES.contains(&resolved.scheme()) {
        debug!("Dropping non-fetchable link {:?}", href);
        return None;
    }
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        debug!("Dropping link with scheme {:?}: {:?}", resolved.scheme(), href);
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Host plus explicit port, the identity used for same-domain comparisons.
/// Two ports on one host are different sites.
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

pub fn is_same_domain(url: &Url, origin: &str) -> bool {
    authority(url) == origin
}

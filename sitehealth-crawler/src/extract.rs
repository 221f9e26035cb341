use crate::url_tools::normalize_url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Pull every checkable reference out of a page body: anchors, images,
/// stylesheet links and script sources. Parsing is best-effort; malformed
/// markup yields whatever structure could be recovered, and an empty set is
/// a valid outcome. Duplicates within one page collapse here.
pub fn extract_links(html: &str, page_url: &Url) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut links = HashSet::new();

    let sources = [
        ("a[href]", "href"),
        ("img[src]", "src"),
        ("link[href]", "href"),
        ("script[src]", "src"),
    ];

    for (selector, attr) in sources {
        let selector = Selector::parse(selector).unwrap();
        for element in document.select(&selector) {
            if let Some(raw) = element.value().attr(attr)
                && let Some(normalized) = normalize_url(raw, page_url)
            {
                links.insert(normalized);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://a.test/blog/post").unwrap()
    }

    #[test]
    fn test_extract_anchor_hrefs() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://ext.test/">Elsewhere</a>
        </body></html>"#;

        let links = extract_links(html, &page());
        assert!(links.contains("https://a.test/about"));
        assert!(links.contains("https://ext.test/"));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_extract_assets() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/css/site.css">
            <script src="/js/app.js"></script>
        </head><body>
            <img src="../images/hero.png" alt="">
        </body></html>"#;

        let links = extract_links(html, &page());
        assert!(links.contains("https://a.test/css/site.css"));
        assert!(links.contains("https://a.test/js/app.js"));
        assert!(links.contains("https://a.test/images/hero.png"));
    }

    #[test]
    fn test_extract_dedupes_within_page() {
        let html = r#"<body>
            <a href="/about">About</a>
            <a href="/about#team">Team</a>
            <a href="/about">About again</a>
        </body>"#;

        let links = extract_links(html, &page());
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://a.test/about"));
    }

    #[test]
    fn test_extract_drops_unfetchable_schemes() {
        let html = r#"<body>
            <a href="mailto:hi@a.test">Mail</a>
            <a href="tel:+1555">Call</a>
            <a href="javascript:void(0)">Noop</a>
            <a href="/real">Real</a>
        </body>"#;

        let links = extract_links(html, &page());
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://a.test/real"));
    }

    #[test]
    fn test_extract_recovers_from_malformed_html() {
        let html = r#"<body><div><a href="/ok">unclosed<p><img src="/pic.gif""#;

        let links = extract_links(html, &page());
        assert!(links.contains("https://a.test/ok"));
    }

    #[test]
    fn test_extract_empty_page_is_empty_set() {
        assert!(extract_links("", &page()).is_empty());
        assert!(extract_links("just text, no markup", &page()).is_empty());
    }
}

use reqwest::Client;
use tracing::debug;
use url::Url;

/// Decides whether a same-domain page may be fetched. The engine consults
/// this before every page fetch; disallowed pages are skipped without
/// producing a result.
pub trait RobotsPolicy: Send + Sync {
    fn is_allowed(&self, url: &Url) -> bool;
}

/// Policy used when robots.txt handling is disabled.
pub struct AllowAll;

impl RobotsPolicy for AllowAll {
    fn is_allowed(&self, _url: &Url) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RuleKind {
    Allow,
    Disallow,
}

#[derive(Debug, Clone)]
struct Rule {
    kind: RuleKind,
    prefix: String,
}

/// Minimal robots.txt interpretation: rules from `User-agent: *` groups,
/// prefix matching with the longest match winning, Allow beating Disallow
/// on equal length. A missing or unreadable file allows everything.
#[derive(Debug, Default)]
pub struct RobotsRules {
    rules: Vec<Rule>,
}

impl RobotsRules {
    pub fn parse(body: &str) -> Self {
        let mut rules = Vec::new();
        let mut in_wildcard_group = false;
        let mut seen_directive_in_group = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A new group starts at the first user-agent line after
                    // directives were recorded.
                    if seen_directive_in_group {
                        in_wildcard_group = false;
                        seen_directive_in_group = false;
                    }
                    if value == "*" {
                        in_wildcard_group = true;
                    }
                }
                "allow" | "disallow" if in_wildcard_group => {
                    seen_directive_in_group = true;
                    if value.is_empty() {
                        // "Disallow:" with no path allows everything.
                        continue;
                    }
                    rules.push(Rule {
                        kind: if key == "allow" {
                            RuleKind::Allow
                        } else {
                            RuleKind::Disallow
                        },
                        prefix: value.to_string(),
                    });
                }
                _ => {
                    if in_wildcard_group && !key.is_empty() {
                        seen_directive_in_group = true;
                    }
                }
            }
        }

        RobotsRules { rules }
    }

    /// Fetch and parse `/robots.txt` for the seed's site. Any failure,
    /// including a non-2xx response, degrades to allow-all.
    pub async fn fetch(client: &Client, base: &Url) -> Self {
        let robots_url = match base.join("/robots.txt") {
            Ok(url) => url,
            Err(_) => return RobotsRules::default(),
        };

        match client.get(robots_url.as_str()).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    let rules = RobotsRules::parse(&body);
                    debug!("Loaded {} robots.txt rules from {}", rules.rules.len(), robots_url);
                    rules
                }
                Err(e) => {
                    debug!("Failed to read robots.txt body: {}", e);
                    RobotsRules::default()
                }
            },
            Ok(response) => {
                debug!("robots.txt returned HTTP {}, allowing all", response.status());
                RobotsRules::default()
            }
            Err(e) => {
                debug!("robots.txt fetch failed ({}), allowing all", e);
                RobotsRules::default()
            }
        }
    }
}

impl RobotsPolicy for RobotsRules {
    fn is_allowed(&self, url: &Url) -> bool {
        let path = url.path();

        let best = self
            .rules
            .iter()
            .filter(|rule| path.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| (rule.prefix.len(), rule.kind == RuleKind::Allow));

        match best {
            Some(rule) => rule.kind == RuleKind::Allow,
            None => true,
        }
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Crawl settings as seen by the CLI: config-file values overridden by
/// whatever the user passed on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub url: Option<String>,
    pub depth: usize,
    pub max_concurrent: usize,
    pub timeout: f64,
    pub respect_robots: bool,
    pub output_format: String,
    pub output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            depth: 2,
            max_concurrent: 10,
            timeout: 10.0,
            respect_robots: true,
            output_format: "terminal".to_string(),
            output_path: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub depth: Option<usize>,
    pub max_concurrent: Option<usize>,
    pub timeout: Option<f64>,
    pub no_robots: bool,
    pub output_format: Option<String>,
    pub output_path: Option<String>,
}

impl Config {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Config file not found: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn merge_with_args(mut self, overrides: &CliOverrides) -> Self {
        if let Some(url) = &overrides.url {
            self.url = Some(url.clone());
        }
        if let Some(depth) = overrides.depth {
            self.depth = depth;
        }
        if let Some(max_concurrent) = overrides.max_concurrent {
            self.max_concurrent = max_concurrent;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if overrides.no_robots {
            self.respect_robots = false;
        }
        if let Some(format) = &overrides.output_format {
            self.output_format = format.clone();
        }
        if let Some(path) = &overrides.output_path {
            self.output_path = Some(path.clone());
        }
        self
    }
}

//! Configuration management for the graph generator

use crate::series::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Path to the status snapshot (`summary.json`)
    pub summary_path: PathBuf,

    /// Directory rendered graphs are written to
    pub output_dir: PathBuf,

    /// File name prefix for every rendered graph
    pub graph_prefix: String,

    /// Number of most recent UTC days in each series
    pub lookback_days: u32,

    /// Abort the batch on the first failing service
    pub fail_fast: bool,

    /// Optional exported issue list summarised into the incident digest
    pub incidents_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            summary_path: PathBuf::from("history/summary.json"),
            output_dir: PathBuf::from("graphs"),
            graph_prefix: "uptime".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fail_fast: false,
            incidents_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(summary_path) = lookup("SUMMARY_PATH") {
            config.summary_path = PathBuf::from(summary_path);
        }

        if let Some(output_dir) = lookup("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }

        if let Some(prefix) = lookup("GRAPH_PREFIX") {
            config.graph_prefix = prefix.trim().to_string();
        }

        if let Some(lookback) = lookup("LOOKBACK_DAYS") {
            if let Ok(days) = lookback.trim().parse() {
                config.lookback_days = days;
            }
        }

        if let Some(fail_fast) = lookup("FAIL_FAST") {
            config.fail_fast = fail_fast.trim().to_lowercase() == "true";
        }

        if let Some(incidents_path) = lookup("INCIDENTS_PATH") {
            let incidents_path = incidents_path.trim();
            config.incidents_path = if incidents_path.is_empty() {
                None
            } else {
                Some(PathBuf::from(incidents_path))
            };
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.summary_path.as_os_str().is_empty() {
            return Err("summary_path cannot be empty".to_string());
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err("output_dir cannot be empty".to_string());
        }

        if self.graph_prefix.is_empty() {
            return Err("graph_prefix cannot be empty".to_string());
        }

        if !crate::record::is_safe_slug(&self.graph_prefix) {
            return Err(format!(
                "graph_prefix {:?} is not safe to use in a file name",
                self.graph_prefix
            ));
        }

        if self.lookback_days == 0 {
            return Err("lookback_days must be greater than 0".to_string());
        }

        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(format!(
                "lookback_days must be at most {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            ));
        }

        Ok(())
    }
}

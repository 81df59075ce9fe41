use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::card::FetchTask;
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub tasks: Vec<FetchTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,
    /// Retrievals in flight at once (default 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Per-event deadline, e.g. "20s"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout: Option<String>,
    /// How long a computed batch is served from cache, e.g. "10m"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,
}

impl Config {
    pub fn fetch_timeout(&self) -> Result<Option<Duration>> {
        parse_optional_duration("fetch_timeout", self.fetch_timeout.as_deref())
    }

    pub fn cache_ttl(&self) -> Result<Option<Duration>> {
        parse_optional_duration("cache_ttl", self.cache_ttl.as_deref())
    }

    /// Check the whole file, returning every problem at once.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.concurrency == Some(0) {
            errors.push("concurrency: must be at least 1".to_string());
        }
        for result in [self.fetch_timeout(), self.cache_ttl()] {
            match result {
                Ok(Some(d)) if d.is_zero() => errors.push(format!("duration must be non-zero, got {:?}", d)),
                Ok(_) => {}
                Err(e) => errors.push(format!("{:#}", e)),
            }
        }
        for (i, task) in self.tasks.iter().enumerate() {
            if task.source_url.trim().is_empty() {
                errors.push(format!("tasks[{}]: source_url must not be empty", i));
            }
            if task.event_key.trim().is_empty() {
                errors.push(format!("tasks[{}]: event_key must not be empty", i));
            }
        }
        if let Some(scoring) = &self.scoring {
            if let Err(scoring_errors) = crate::scoring::validate_scoring(scoring) {
                errors.extend(scoring_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_optional_duration(field: &str, value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|v| humantime::parse_duration(v.trim()).with_context(|| format!("{}: invalid duration '{}'", field, v)))
        .transpose()
}

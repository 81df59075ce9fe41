use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::EventSource;
use crate::card::{EventCard, FetchTask};

/// Reads event JSON files from disk; `source_url` is a path, optionally
/// prefixed with `file://`, resolved against `base_dir` when relative.
#[derive(Debug, Clone)]
pub struct FileEventSource {
    base_dir: PathBuf,
}

impl FileEventSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, source_url: &str) -> PathBuf {
        let raw = source_url.strip_prefix("file://").unwrap_or(source_url);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[async_trait]
impl EventSource for FileEventSource {
    async fn fetch(&self, task: &FetchTask) -> Result<EventCard> {
        let path = self.resolve(&task.source_url);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read event file at {}", path.display()))?;
        let card: EventCard = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse event JSON in {}", path.display()))?;
        Ok(card)
    }

    fn name(&self) -> &str {
        "file"
    }
}

use anyhow::Result;
use async_trait::async_trait;

use super::{EventSource, FileEventSource, HttpEventSource};
use crate::card::{EventCard, FetchTask};

/// Sends `http://` and `https://` tasks to the HTTP source and everything
/// else to the file source, so one task list can mix both.
#[derive(Debug, Clone)]
pub struct RoutedEventSource {
    http: HttpEventSource,
    file: FileEventSource,
}

impl RoutedEventSource {
    pub fn new(http: HttpEventSource, file: FileEventSource) -> Self {
        Self { http, file }
    }
}

pub fn is_http_url(source_url: &str) -> bool {
    let lower = source_url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl EventSource for RoutedEventSource {
    async fn fetch(&self, task: &FetchTask) -> Result<EventCard> {
        if is_http_url(&task.source_url) {
            self.http.fetch(task).await
        } else {
            self.file.fetch(task).await
        }
    }

    fn name(&self) -> &str {
        "routed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://cards.example.com/a.json"));
        assert!(is_http_url("HTTP://cards.example.com/a.json"));
        assert!(!is_http_url("file:///tmp/a.json"));
        assert!(!is_http_url("cards/a.json"));
    }

    #[tokio::test]
    async fn test_file_tasks_go_to_file_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"event_id": "a", "entrants": [{"name": "Solo"}]}"#).unwrap();

        let source = RoutedEventSource::new(
            HttpEventSource::with_timeout(Duration::from_secs(1)).unwrap(),
            FileEventSource::new(dir.path()),
        );
        let card = source.fetch(&FetchTask::new("a.json", "a")).await.unwrap();
        assert_eq!(card.event_id, "a");
    }
}

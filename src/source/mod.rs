pub mod client;
pub mod file;
pub mod http;
pub mod router;

pub use client::{create_client, install_crypto_provider};
pub use file::FileEventSource;
pub use http::HttpEventSource;
pub use router::{is_http_url, RoutedEventSource};

use anyhow::Result;
use async_trait::async_trait;

use crate::card::{EventCard, FetchTask};

/// Retrieves and parses one event.
///
/// Implementations own wire formats and field extraction; they hand back an
/// already-normalized `EventCard`.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch(&self, task: &FetchTask) -> Result<EventCard>;

    /// Source name for logging
    fn name(&self) -> &str;
}

pub mod cache;
pub mod card;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod report;
pub mod scoring;
pub mod source;
pub mod telemetry;

pub use error::RankerError;

//! Output documents handed to presentation layers.

use std::path::Path;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::EventContext;
use crate::scoring::{ConfidenceAssessment, Picks, ScoredEntrant};

pub const DISCLAIMER: &str = "These rankings represent statistical analysis only. \
They are not predictions or guarantees. Race outcomes are inherently uncertain.";

/// Ranked output for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub event_id: String,
    pub meta: EventContext,
    pub entrants: Vec<ScoredEntrant>,
    pub picks: Picks,
    pub confidence: ConfidenceAssessment,
    pub disclaimer: String,
}

impl EventReport {
    pub fn new(
        event_id: String,
        meta: EventContext,
        entrants: Vec<ScoredEntrant>,
        picks: Picks,
        confidence: ConfidenceAssessment,
    ) -> Self {
        Self {
            event_id,
            meta,
            entrants,
            picks,
            confidence,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

/// All events computed for one request key (usually a date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub key: String,
    pub generated_at: DateTime<Utc>,
    pub events: Vec<EventReport>,
}

impl BatchReport {
    /// Build a batch with events in presentation order: date, off time, id.
    pub fn new(key: impl Into<String>, generated_at: DateTime<Utc>, mut events: Vec<EventReport>) -> Self {
        events.sort_by(|a, b| {
            a.meta
                .date
                .cmp(&b.meta.date)
                .then_with(|| a.meta.off_time.cmp(&b.meta.off_time))
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        Self {
            key: key.into(),
            generated_at,
            events,
        }
    }
}

/// Write a batch as pretty JSON atomically
///
/// The destination is never left half-written; the parent directory must exist.
pub fn save_batch(path: &Path, batch: &BatchReport) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, batch).context("Failed to serialize batch")?;

    file.commit()
        .with_context(|| format!("Failed to save batch to {}", path.display()))?;

    Ok(())
}

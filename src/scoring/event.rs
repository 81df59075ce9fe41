use chrono::NaiveDate;

use super::components::FieldContext;
use super::config::ScoringConfig;
use super::confidence::assess_confidence;
use super::engine::calculate_score;
use super::ranking::{rank_entrants, select_picks};
use crate::card::{validate_entrants, EventCard};
use crate::error::RankerError;
use crate::report::EventReport;

/// Validate, score, rank and classify one event.
///
/// Fails only when no entrant survives validation.
pub fn score_event(card: EventCard, config: &ScoringConfig, as_of: NaiveDate) -> Result<EventReport, RankerError> {
    let event_id = card.resolved_id();
    let entrants = validate_entrants(&event_id, card.entrants);
    if entrants.is_empty() {
        return Err(RankerError::EmptyEvent { event_key: event_id });
    }

    let field = FieldContext {
        entrants: &entrants,
        event: &card.meta,
        as_of,
    };
    let scored: Vec<_> = entrants
        .iter()
        .map(|entrant| (entrant.clone(), calculate_score(entrant, &field, config)))
        .collect();

    let ranked = rank_entrants(scored);
    let picks = select_picks(&ranked);
    let confidence = assess_confidence(&ranked);

    tracing::debug!(
        event = %event_id,
        entrants = ranked.len(),
        band = %confidence.band,
        margin = confidence.margin,
        "scored event"
    );

    Ok(EventReport::new(event_id, card.meta, ranked, picks, confidence))
}

pub mod conditions;
pub mod types;

pub use types::{EntrantRecord, EventCard, EventContext, FetchTask, FormLine, MAX_FORM_LINES};

/// Drop entrants that lack a usable identity.
///
/// Each excluded record is logged; an empty result means the whole event is
/// unusable and should be treated like an event with zero entrants.
pub fn validate_entrants(event_id: &str, entrants: Vec<EntrantRecord>) -> Vec<EntrantRecord> {
    let total = entrants.len();
    let valid: Vec<_> = entrants
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entrant)| {
            if entrant.name.trim().is_empty() {
                tracing::warn!(event = event_id, index = idx, "entrant has no name, excluded from scoring");
                None
            } else {
                Some(entrant)
            }
        })
        .collect();

    if valid.len() < total {
        tracing::debug!(event = event_id, kept = valid.len(), total, "entrant validation");
    }
    valid
}

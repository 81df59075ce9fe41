use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::conditions::{de_weight, slugify};

/// Most historical runs considered per entrant.
pub const MAX_FORM_LINES: usize = 6;

/// One historical outcome for an entrant. Most recent first in `recent_form`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormLine {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub going: Option<String>,
    #[serde(default)]
    pub race_class: Option<String>,
    #[serde(default)]
    pub track: Option<String>,
    /// Starting price (decimal) recorded for that run
    #[serde(default)]
    pub sp_decimal: Option<f64>,
    /// Identity of the historical event, when the source exposes one
    #[serde(default)]
    pub event_key: Option<String>,
}

impl FormLine {
    /// Key grouping all entrants that ran in the same historical event.
    ///
    /// Uses the explicit event key when present, otherwise date + track.
    pub fn cohort_key(&self) -> Option<String> {
        if let Some(key) = self.event_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Some(key.trim().to_lowercase());
        }
        match (self.date, self.track.as_deref()) {
            (Some(date), Some(track)) if !track.trim().is_empty() => {
                Some(format!("{}|{}", date, track.trim().to_lowercase()))
            }
            _ => None,
        }
    }
}

/// An entrant as supplied by a source collaborator. Never mutated by scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrantRecord {
    #[serde(alias = "runner_name")]
    pub name: String,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub draw: Option<u32>,
    #[serde(default)]
    pub age: Option<u32>,
    /// Carried weight in pounds
    #[serde(default, alias = "weight", deserialize_with = "de_weight")]
    pub weight_lbs: Option<u32>,
    #[serde(default)]
    pub official_rating: Option<u32>,
    /// Primary performance rating
    #[serde(default)]
    pub rpr: Option<u32>,
    /// Speed rating
    #[serde(default)]
    pub ts: Option<u32>,
    #[serde(default)]
    pub odds_decimal: Option<f64>,
    #[serde(default)]
    pub jockey: Option<String>,
    #[serde(default)]
    pub trainer: Option<String>,
    /// Trainer runs-to-form percentage
    #[serde(default)]
    pub trainer_rtf: Option<f64>,
    #[serde(default)]
    pub days_since_last_run: Option<i64>,
    #[serde(default)]
    pub course_winner: Option<bool>,
    #[serde(default)]
    pub distance_winner: Option<bool>,
    #[serde(default)]
    pub cd_winner: Option<bool>,
    #[serde(default)]
    pub recent_form: Vec<FormLine>,
}

impl EntrantRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The last `MAX_FORM_LINES` runs, most recent first
    pub fn form(&self) -> &[FormLine] {
        let len = self.recent_form.len().min(MAX_FORM_LINES);
        &self.recent_form[..len]
    }

    /// Decimal odds usable as a market signal
    pub fn usable_odds(&self) -> Option<f64> {
        self.odds_decimal.filter(|o| o.is_finite() && *o > 1.01)
    }
}

/// Today's conditions for an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub off_time: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub going: Option<String>,
    #[serde(default)]
    pub race_class: Option<String>,
    #[serde(default)]
    pub race_name: Option<String>,
    #[serde(default)]
    pub runners_count: Option<u32>,
}

/// One parsed event as handed over by a source collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCard {
    #[serde(default, alias = "race_id")]
    pub event_id: String,
    #[serde(default)]
    pub meta: EventContext,
    #[serde(default, alias = "runners")]
    pub entrants: Vec<EntrantRecord>,
}

impl EventCard {
    /// The supplied event id, or a slug of track-date-off_time when blank
    pub fn resolved_id(&self) -> String {
        if !self.event_id.trim().is_empty() {
            return self.event_id.trim().to_string();
        }
        let seed = format!(
            "{}-{}-{}",
            self.meta.track.as_deref().unwrap_or("unknown"),
            self.meta
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string()),
            self.meta.off_time.as_deref().unwrap_or("")
        );
        slugify(&seed)
    }
}

/// One external retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchTask {
    pub source_url: String,
    pub event_key: String,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
}

impl FetchTask {
    pub fn new(source_url: impl Into<String>, event_key: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            event_key: event_key.into(),
            metadata: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cohort_key_prefers_event_key() {
        let line = FormLine {
            event_key: Some(" Kempton-1430 ".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 1, 4),
            track: Some("Kempton".to_string()),
            ..Default::default()
        };
        assert_eq!(line.cohort_key().as_deref(), Some("kempton-1430"));
    }

    #[test]
    fn test_cohort_key_falls_back_to_date_and_track() {
        let line = FormLine {
            date: NaiveDate::from_ymd_opt(2026, 1, 4),
            track: Some("Kempton".to_string()),
            ..Default::default()
        };
        assert_eq!(line.cohort_key().as_deref(), Some("2026-01-04|kempton"));

        let undated = FormLine {
            track: Some("Kempton".to_string()),
            ..Default::default()
        };
        assert!(undated.cohort_key().is_none());
    }

    #[test]
    fn test_form_truncates_to_six() {
        let mut entrant = EntrantRecord::new("Runner");
        entrant.recent_form = (1..=9)
            .map(|p| FormLine {
                position: Some(p),
                ..Default::default()
            })
            .collect();
        assert_eq!(entrant.form().len(), MAX_FORM_LINES);
        assert_eq!(entrant.form()[0].position, Some(1));
    }

    #[test]
    fn test_usable_odds() {
        let mut entrant = EntrantRecord::new("Runner");
        assert!(entrant.usable_odds().is_none());
        entrant.odds_decimal = Some(1.01);
        assert!(entrant.usable_odds().is_none());
        entrant.odds_decimal = Some(2.5);
        assert_eq!(entrant.usable_odds(), Some(2.5));
    }

    #[test]
    fn test_event_card_parses_collaborator_json() {
        let json = r#"{
            "race_id": "cheltenham-2026-03-10-14-30",
            "meta": {"track": "Cheltenham", "date": "2026-03-10", "distance": "2m4f", "going": "Good to Soft"},
            "runners": [
                {"runner_name": "Desert Crown", "weight": "11-4", "odds_decimal": 3.5,
                 "recent_form": [{"position": 1, "date": "2026-02-01", "sp_decimal": 2.0}]},
                {"name": "Harbour Light", "weight_lbs": 150}
            ]
        }"#;
        let card: EventCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.event_id, "cheltenham-2026-03-10-14-30");
        assert_eq!(card.entrants.len(), 2);
        assert_eq!(card.entrants[0].name, "Desert Crown");
        assert_eq!(card.entrants[0].weight_lbs, Some(158));
        assert_eq!(card.entrants[1].weight_lbs, Some(150));
        assert_eq!(card.entrants[0].recent_form[0].sp_decimal, Some(2.0));
    }

    #[test]
    fn test_resolved_id_slug() {
        let card = EventCard {
            event_id: String::new(),
            meta: EventContext {
                track: Some("Ascot".to_string()),
                date: NaiveDate::from_ymd_opt(2026, 6, 16),
                off_time: Some("14:30".to_string()),
                ..Default::default()
            },
            entrants: vec![],
        };
        assert_eq!(card.resolved_id(), "ascot-2026-06-16-14-30");
    }
}

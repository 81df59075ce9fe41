pub mod components;
pub mod config;
pub mod confidence;
pub mod engine;
pub mod event;
pub mod ranking;
pub mod validation;

pub use components::{Component, FieldContext, RatingSource, SCORERS};
pub use config::*;
pub use confidence::{assess_confidence, Band, ConfidenceAssessment};
pub use engine::{calculate_score, ComponentScore, ScoreResult};
pub use event::score_event;
pub use ranking::{rank_entrants, select_picks, Pick, Picks, ScoredEntrant};
pub use validation::validate_scoring;

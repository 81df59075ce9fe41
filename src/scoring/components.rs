use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::ScoringConfig;
use crate::card::conditions::{furlongs, going_scale};
use crate::card::{EntrantRecord, EventContext};

/// A scoring component. Declaration order is the canonical iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Market,
    Rating,
    Form,
    Suitability,
    Freshness,
    CdProfile,
    Connections,
    MarketExpectation,
}

impl Component {
    pub const ALL: [Component; 8] = [
        Component::Market,
        Component::Rating,
        Component::Form,
        Component::Suitability,
        Component::Freshness,
        Component::CdProfile,
        Component::Connections,
        Component::MarketExpectation,
    ];

    /// Human-readable label for explanations
    pub fn label(&self) -> &'static str {
        match self {
            Component::Market => "Market",
            Component::Rating => "Rating",
            Component::Form => "Form",
            Component::Suitability => "Suitability",
            Component::Freshness => "Freshness",
            Component::CdProfile => "C/D Profile",
            Component::Connections => "Connections",
            Component::MarketExpectation => "Market Expectation",
        }
    }
}

/// Raw output of one scorer: a 0-100 score, or None when there is no signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub score: Option<f64>,
    pub reason: String,
}

impl Signal {
    fn scored(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score: Some(round1(score.clamp(0.0, 100.0))),
            reason: reason.into(),
        }
    }

    fn missing(reason: impl Into<String>) -> Self {
        Self {
            score: None,
            reason: reason.into(),
        }
    }
}

/// Everything a scorer may look at besides the entrant itself.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// The whole field, including the entrant being scored
    pub entrants: &'a [EntrantRecord],
    pub event: &'a EventContext,
    /// Reference date for "days since" calculations
    pub as_of: NaiveDate,
}

pub type ScorerFn = fn(&EntrantRecord, &FieldContext<'_>, &ScoringConfig) -> Signal;

pub struct ScorerDescriptor {
    pub component: Component,
    pub score: ScorerFn,
}

/// Scorers in canonical component order.
pub const SCORERS: [ScorerDescriptor; 8] = [
    ScorerDescriptor { component: Component::Market, score: score_market },
    ScorerDescriptor { component: Component::Rating, score: score_rating },
    ScorerDescriptor { component: Component::Form, score: score_form },
    ScorerDescriptor { component: Component::Suitability, score: score_suitability },
    ScorerDescriptor { component: Component::Freshness, score: score_freshness },
    ScorerDescriptor { component: Component::CdProfile, score: score_cd_profile },
    ScorerDescriptor { component: Component::Connections, score: score_connections },
    ScorerDescriptor { component: Component::MarketExpectation, score: score_market_expectation },
];

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// --- market ---------------------------------------------------------------

const MARKET_SCALE: f64 = 1.4;

pub fn score_market(entrant: &EntrantRecord, _field: &FieldContext<'_>, _config: &ScoringConfig) -> Signal {
    let Some(odds) = entrant.usable_odds() else {
        return Signal::missing("No odds available");
    };
    let implied = 1.0 / odds;
    let raw = (implied * 100.0 * MARKET_SCALE).clamp(1.0, 100.0);
    Signal::scored(raw, format!("Odds {:.1} (implied {:.1}%)", odds, implied * 100.0))
}

// --- rating ---------------------------------------------------------------

/// Where a rating can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSource {
    PerformanceRating,
    SpeedRating,
    OfficialRating,
    CarriedWeight,
}

/// Candidate rating sources, best first. Carried weight is a last-resort proxy.
pub const RATING_PRIORITY: [RatingSource; 4] = [
    RatingSource::PerformanceRating,
    RatingSource::SpeedRating,
    RatingSource::OfficialRating,
    RatingSource::CarriedWeight,
];

impl RatingSource {
    pub fn extract(&self, entrant: &EntrantRecord) -> Option<f64> {
        let value = match self {
            RatingSource::PerformanceRating => entrant.rpr,
            RatingSource::SpeedRating => entrant.ts,
            RatingSource::OfficialRating => entrant.official_rating,
            RatingSource::CarriedWeight => entrant.weight_lbs,
        };
        value.filter(|v| *v > 0).map(f64::from)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingSource::PerformanceRating => "RPR",
            RatingSource::SpeedRating => "TS",
            RatingSource::OfficialRating => "OR",
            RatingSource::CarriedWeight => "Weight (lbs)",
        }
    }
}

pub fn score_rating(entrant: &EntrantRecord, field: &FieldContext<'_>, _config: &ScoringConfig) -> Signal {
    for source in RATING_PRIORITY {
        let Some(value) = source.extract(entrant) else {
            continue;
        };

        let values: Vec<f64> = field.entrants.iter().filter_map(|e| source.extract(e)).collect();
        if values.len() < 2 {
            return Signal::scored(
                50.0,
                format!("{} {} (only rated entrant on this source, neutral)", source.label(), value),
            );
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let spread = if max > min { max - min } else { 1.0 };
        let score = 50.0 + 50.0 * (value - min) / spread;
        return Signal::scored(
            score,
            format!("{} {} (field range {}-{})", source.label(), value, min, max),
        );
    }

    Signal::missing("No rating or weight data")
}

// --- form -----------------------------------------------------------------

/// Points for a single finishing position.
pub fn position_score(position: u32) -> f64 {
    match position {
        1 => 100.0,
        2 => 85.0,
        3 => 72.0,
        4 => 55.0,
        5 => 40.0,
        6 => 25.0,
        p => (100 - (i64::from(p) - 1) * 15).max(0) as f64,
    }
}

const CONSISTENCY_BONUS: f64 = 5.0;

pub fn score_form(entrant: &EntrantRecord, _field: &FieldContext<'_>, _config: &ScoringConfig) -> Signal {
    let form = entrant.form();
    if form.is_empty() {
        return Signal::missing("No recent form data");
    }

    // Recency index is the slot in the form list, even when a slot has no position
    let positions: Vec<(u32, usize)> = form
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| line.position.filter(|p| *p >= 1).map(|p| (p, idx)))
        .collect();

    if positions.is_empty() {
        return Signal::missing("Form data present but no parseable finishing positions");
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (pos, idx) in &positions {
        let recency = 1.0 / (1.0 + *idx as f64 * 0.3);
        weighted += position_score(*pos) * recency;
        total_weight += recency;
    }
    let mut score = weighted / total_weight;

    let figures = positions
        .iter()
        .map(|(p, _)| p.to_string())
        .collect::<Vec<_>>()
        .join("/");

    let consistent = positions.len() >= 2 && positions.iter().all(|(p, _)| *p <= 3);
    if consistent {
        score = (score + CONSISTENCY_BONUS).min(100.0);
        return Signal::scored(
            score,
            format!("Recent positions: {} (recency-weighted avg, consistency bonus)", figures),
        );
    }

    Signal::scored(score, format!("Recent positions: {} (recency-weighted avg)", figures))
}

// --- suitability ----------------------------------------------------------

pub fn score_suitability(entrant: &EntrantRecord, field: &FieldContext<'_>, _config: &ScoringConfig) -> Signal {
    let form = entrant.form();
    if form.is_empty() {
        return Signal::missing("No form to assess suitability");
    }

    let today_dist = field.event.distance.as_deref().and_then(furlongs);
    let today_going = field.event.going.as_deref().and_then(going_scale);
    let today_track = field
        .event
        .track
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    // The venue only adds a bonus; it cannot carry the component on its own
    if today_dist.is_none() && today_going.is_none() {
        return Signal::missing("No race distance or going to compare against");
    }

    let mut dist_matches = 0usize;
    let mut going_matches = 0usize;
    let mut course_matches = 0usize;

    for run in form {
        if let (Some(today), Some(then)) = (today_dist, run.distance.as_deref().and_then(furlongs)) {
            if (today - then).abs() <= 1.0 {
                dist_matches += 1;
            }
        }
        if let (Some(today), Some(then)) = (today_going, run.going.as_deref().and_then(going_scale)) {
            if (today - then).abs() <= 1.0 {
                going_matches += 1;
            }
        }
        if let (Some(today), Some(then)) = (today_track.as_deref(), run.track.as_deref()) {
            if then.to_lowercase().contains(today) {
                course_matches += 1;
            }
        }
    }

    let runs = form.len();
    let mut score = 50.0;
    let mut reasons = Vec::new();

    if today_dist.is_some() {
        score += dist_matches as f64 / runs as f64 * 20.0;
        if dist_matches > 0 {
            reasons.push(format!("{}/{} runs at similar distance", dist_matches, runs));
        }
    }
    if today_going.is_some() {
        score += going_matches as f64 / runs as f64 * 20.0;
        if going_matches > 0 {
            reasons.push(format!("{}/{} runs on similar going", going_matches, runs));
        }
    }
    if let Some(track) = field.event.track.as_deref().filter(|_| today_track.is_some()) {
        score += course_matches as f64 / runs as f64 * 10.0;
        if course_matches > 0 {
            reasons.push(format!("{}/{} runs at {}", course_matches, runs, track));
        }
    }

    let reason = if reasons.is_empty() {
        "Limited suitability data".to_string()
    } else {
        reasons.join("; ")
    };
    Signal::scored(score, reason)
}

// --- freshness ------------------------------------------------------------

/// Days since the entrant last ran, preferring the supplied figure over the
/// most recent dated form line.
pub fn days_since_last_run(entrant: &EntrantRecord, as_of: NaiveDate) -> Option<i64> {
    if let Some(days) = entrant.days_since_last_run.filter(|d| *d >= 0) {
        return Some(days);
    }
    let last = entrant.form().iter().filter_map(|line| line.date).max()?;
    let days = (as_of - last).num_days();
    (days >= 0).then_some(days)
}

/// Runs closer together than this are a quick turnaround whatever the window says.
pub const QUICK_TURNAROUND_DAYS: i64 = 7;

pub fn score_freshness(entrant: &EntrantRecord, field: &FieldContext<'_>, config: &ScoringConfig) -> Signal {
    let Some(days) = days_since_last_run(entrant, field.as_of) else {
        return Signal::missing("No last-run date available");
    };

    let window = &config.freshness;
    let (score, note) = if days < QUICK_TURNAROUND_DAYS {
        (55.0, "quick turnaround")
    } else if days < window.optimal_min_days {
        (68.0, "slightly short break")
    } else if days <= window.optimal_max_days {
        (100.0, "optimal break")
    } else if days <= 60 {
        (80.0, "moderate break")
    } else if days <= 120 {
        (58.0, "long break")
    } else {
        (30.0, "very long absence")
    };

    Signal::scored(score, format!("{} days since last run ({})", days, note))
}

// --- course/distance profile ----------------------------------------------

const CD_BASE: f64 = 50.0;

pub fn score_cd_profile(entrant: &EntrantRecord, _field: &FieldContext<'_>, _config: &ScoringConfig) -> Signal {
    if entrant.cd_winner.is_none() && entrant.course_winner.is_none() && entrant.distance_winner.is_none() {
        return Signal::missing("No course/distance data");
    }

    let course = entrant.course_winner == Some(true);
    let distance = entrant.distance_winner == Some(true);

    if entrant.cd_winner == Some(true) || (course && distance) {
        Signal::scored(CD_BASE + 40.0, "Course and distance winner")
    } else if course {
        Signal::scored(CD_BASE + 20.0, "Course winner")
    } else if distance {
        Signal::scored(CD_BASE + 15.0, "Distance winner")
    } else {
        Signal::scored(CD_BASE, "No course or distance wins")
    }
}

// --- connections ----------------------------------------------------------

pub fn score_connections(entrant: &EntrantRecord, _field: &FieldContext<'_>, config: &ScoringConfig) -> Signal {
    if let Some(rate) = entrant.trainer_rtf.filter(|r| r.is_finite() && *r >= 0.0) {
        let score = (20.0 + rate * 2.3).clamp(15.0, 95.0);
        let yard = if rate >= config.trainer_rtf.hot {
            "in-form yard"
        } else if rate <= config.trainer_rtf.cold {
            "cold yard"
        } else {
            "steady yard"
        };
        let trainer = entrant.trainer.as_deref().unwrap_or("Trainer");
        return Signal::scored(score, format!("{} RTF {:.0}% ({})", trainer, rate, yard));
    }

    let mut parts = Vec::new();
    if let Some(jockey) = entrant.jockey.as_deref().filter(|j| !j.trim().is_empty()) {
        parts.push(format!("J: {}", jockey));
    }
    if let Some(trainer) = entrant.trainer.as_deref().filter(|t| !t.trim().is_empty()) {
        parts.push(format!("T: {}", trainer));
    }
    if parts.is_empty() {
        return Signal::missing("No jockey/trainer data");
    }

    Signal::scored(
        50.0,
        format!("Connections: {} (no form-rate available; neutral)", parts.join(", ")),
    )
}

// --- market expectation ---------------------------------------------------

const PRICE_EPSILON: f64 = 1e-9;

pub fn score_market_expectation(
    entrant: &EntrantRecord,
    field: &FieldContext<'_>,
    config: &ScoringConfig,
) -> Signal {
    let Some(last) = entrant.form().first() else {
        return Signal::missing("No previous run");
    };
    let Some(sp) = last.sp_decimal.filter(|sp| sp.is_finite() && *sp > 1.0) else {
        return Signal::missing("No starting price for last run");
    };

    // Other members of the field that ran in the same historical event
    let rivals: Vec<f64> = match last.cohort_key() {
        Some(key) => field
            .entrants
            .iter()
            .filter(|other| other.name != entrant.name)
            .filter_map(|other| {
                other
                    .form()
                    .iter()
                    .find(|line| line.cohort_key().as_deref() == Some(key.as_str()))
                    .and_then(|line| line.sp_decimal)
            })
            .filter(|p| p.is_finite() && *p > 1.0)
            .collect(),
        None => Vec::new(),
    };

    let weights = &config.market_expectation;
    let mut score = 50.0;
    let mut notes = Vec::new();

    if !rivals.is_empty() {
        let shortest = rivals.iter().copied().fold(sp, f64::min);
        let favorite = (sp - shortest).abs() < PRICE_EPSILON;
        if favorite {
            let joint = rivals.iter().any(|p| (p - shortest).abs() < PRICE_EPSILON);
            let beaten = last.position.is_some_and(|p| p > 1);
            score += weights.last_fav;
            if joint {
                score += weights.last_joint_fav;
                notes.push("joint favorite");
            } else {
                notes.push("favorite");
            }
            if beaten {
                score += weights.last_beaten_fav;
                notes.push("beaten");
            }
        }
    }

    let clipped = sp.clamp(weights.odds_min, weights.odds_max);
    let inverse = (1.0 / clipped - 1.0 / weights.odds_max) / (1.0 / weights.odds_min - 1.0 / weights.odds_max);
    score += weights.confidence_scale * inverse.clamp(0.0, 1.0);

    let cohort = if rivals.is_empty() {
        "no cohort prices".to_string()
    } else {
        format!("{} runners priced in that race", rivals.len() + 1)
    };
    let reason = if notes.is_empty() {
        format!("Last run SP {:.2} ({})", sp, cohort)
    } else {
        format!("Last run SP {:.2}, {} ({})", sp, notes.join(", "), cohort)
    };
    Signal::scored(score, reason)
}

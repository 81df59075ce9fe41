use serde::{Deserialize, Serialize};

use super::components::{round1, Component, FieldContext, Signal, SCORERS};
use super::config::ScoringConfig;
use crate::card::EntrantRecord;

/// One component's contribution to an entrant's total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub component: Component,
    /// 0-100, or None when the component had no usable signal
    pub score: Option<f64>,
    /// Redistributed weight; 0 for components without a score
    pub weight: f64,
    pub weighted_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: f64,
    /// Components in canonical order, including those without data
    pub components: Vec<ComponentScore>,
    /// Fraction of the base weight that had data
    pub available_weight: f64,
}

impl ScoreResult {
    /// Number of components that produced a score
    pub fn scored_components(&self) -> usize {
        self.components.iter().filter(|c| c.score.is_some()).count()
    }
}

/// Renormalize base weights over the components that produced a score.
///
/// Returns one weight per component in canonical order. Components without a
/// score get 0; when nothing scored (or the available base weight is 0) every
/// weight is 0.
pub fn redistribute_weights(config: &ScoringConfig, signals: &[(Component, Signal)]) -> Vec<(Component, f64)> {
    let available: f64 = Component::ALL
        .iter()
        .filter(|c| signals.iter().any(|(sc, s)| sc == *c && s.score.is_some()))
        .map(|c| config.weights.get(*c))
        .sum();

    Component::ALL
        .iter()
        .map(|c| {
            let has_score = signals.iter().any(|(sc, s)| sc == c && s.score.is_some());
            let weight = if has_score && available > 0.0 {
                config.weights.get(*c) / available
            } else {
                0.0
            };
            (*c, weight)
        })
        .collect()
}

/// Score one entrant against its field.
pub fn calculate_score(entrant: &EntrantRecord, field: &FieldContext<'_>, config: &ScoringConfig) -> ScoreResult {
    let signals: Vec<(Component, Signal)> = SCORERS
        .iter()
        .map(|scorer| (scorer.component, (scorer.score)(entrant, field, config)))
        .collect();

    let weights = redistribute_weights(config, &signals);

    let mut total = 0.0;
    let mut components = Vec::with_capacity(signals.len());
    for ((component, signal), (_, weight)) in signals.into_iter().zip(weights) {
        let weighted = signal.score.map(|s| s * weight).unwrap_or(0.0);
        total += weighted;
        components.push(ComponentScore {
            component,
            score: signal.score,
            weight,
            weighted_score: (weighted * 100.0).round() / 100.0,
            reason: signal.reason,
        });
    }

    let available_weight: f64 = components
        .iter()
        .filter(|c| c.score.is_some())
        .map(|c| config.weights.get(c.component))
        .sum();

    ScoreResult {
        total_score: round1(total).clamp(0.0, 100.0),
        components,
        available_weight: (available_weight * 100.0).round() / 100.0,
    }
}

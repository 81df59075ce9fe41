use serde::{Deserialize, Serialize};

use super::components::Component;

/// Main scoring configuration.
///
/// Every section falls back to its defaults when omitted, so an empty
/// `scoring:` block is valid.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     market: 0.30
///     rating: 0.25
///     form: 0.18
///     suitability: 0.12
///     freshness: 0.07
///     cd_profile: 0.04
///     connections: 0.03
///     market_expectation: 0.01
///   freshness:
///     optimal_min_days: 14
///     optimal_max_days: 35
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScoringConfig {
    /// Base weight per component; must sum to 1.0
    pub weights: WeightsConfig,

    /// Sub-weights for the last-run market expectation component
    pub market_expectation: MarketExpectationConfig,

    /// Days-since-last-run sweet spot
    pub freshness: FreshnessConfig,

    /// Trainer runs-to-form thresholds used in explanations
    pub trainer_rtf: TrainerRtfConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct WeightsConfig {
    pub market: f64,
    pub rating: f64,
    pub form: f64,
    pub suitability: f64,
    pub freshness: f64,
    pub cd_profile: f64,
    pub connections: f64,
    pub market_expectation: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            market: 0.30,
            rating: 0.25,
            form: 0.18,
            suitability: 0.12,
            freshness: 0.07,
            cd_profile: 0.04,
            connections: 0.03,
            market_expectation: 0.01,
        }
    }
}

impl WeightsConfig {
    /// Base weight for a component
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Market => self.market,
            Component::Rating => self.rating,
            Component::Form => self.form,
            Component::Suitability => self.suitability,
            Component::Freshness => self.freshness,
            Component::CdProfile => self.cd_profile,
            Component::Connections => self.connections,
            Component::MarketExpectation => self.market_expectation,
        }
    }

    /// Sum of all base weights, in component order
    pub fn total(&self) -> f64 {
        Component::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MarketExpectationConfig {
    /// Bonus when the entrant was favourite last time out
    pub last_fav: f64,
    /// Extra bonus when that favourite got beaten
    pub last_beaten_fav: f64,
    /// Adjustment when the favouritism was shared
    pub last_joint_fav: f64,
    /// Points awarded for a short last-run price (scaled 0..1)
    pub confidence_scale: f64,
    pub odds_min: f64,
    pub odds_max: f64,
}

impl Default for MarketExpectationConfig {
    fn default() -> Self {
        Self {
            last_fav: 15.0,
            last_beaten_fav: 20.0,
            last_joint_fav: -5.0,
            confidence_scale: 25.0,
            odds_min: 1.01,
            odds_max: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct FreshnessConfig {
    pub optimal_min_days: i64,
    pub optimal_max_days: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            optimal_min_days: 14,
            optimal_max_days: 35,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TrainerRtfConfig {
    /// At or above this percentage the yard is in form
    pub hot: f64,
    /// At or below this percentage the yard is cold
    pub cold: f64,
}

impl Default for TrainerRtfConfig {
    fn default() -> Self {
        Self {
            hot: 25.0,
            cold: 10.0,
        }
    }
}

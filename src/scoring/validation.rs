use super::components::{Component, QUICK_TURNAROUND_DAYS};
use super::config::ScoringConfig;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for component in Component::ALL {
        let weight = config.weights.get(component);
        if !weight.is_finite() || weight < 0.0 {
            errors.push(format!(
                "scoring.weights.{}: must be a non-negative number, got {}",
                key(component),
                weight
            ));
        }
    }

    let total = config.weights.total();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        errors.push(format!("scoring.weights: must sum to 1.0, got {:.4}", total));
    }

    let me = &config.market_expectation;
    if me.odds_min <= 1.0 || me.odds_max <= me.odds_min {
        errors.push(format!(
            "scoring.market_expectation: need 1.0 < odds_min < odds_max, got {} and {}",
            me.odds_min, me.odds_max
        ));
    }
    if me.confidence_scale < 0.0 {
        errors.push("scoring.market_expectation.confidence_scale: must be non-negative".to_string());
    }

    let fresh = &config.freshness;
    if fresh.optimal_min_days < QUICK_TURNAROUND_DAYS || fresh.optimal_max_days < fresh.optimal_min_days {
        errors.push(format!(
            "scoring.freshness: need {} <= optimal_min_days <= optimal_max_days, got {}-{}",
            QUICK_TURNAROUND_DAYS, fresh.optimal_min_days, fresh.optimal_max_days
        ));
    }

    let rtf = &config.trainer_rtf;
    if rtf.cold > rtf.hot {
        errors.push(format!(
            "scoring.trainer_rtf: cold ({}) must not exceed hot ({})",
            rtf.cold, rtf.hot
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn key(component: Component) -> &'static str {
    match component {
        Component::Market => "market",
        Component::Rating => "rating",
        Component::Form => "form",
        Component::Suitability => "suitability",
        Component::Freshness => "freshness",
        Component::CdProfile => "cd_profile",
        Component::Connections => "connections",
        Component::MarketExpectation => "market_expectation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = ScoringConfig::default();
        config.weights.market = 0.5;
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("sum to 1.0"));
    }

    #[test]
    fn test_negative_weight() {
        let mut config = ScoringConfig::default();
        config.weights.connections = -0.03;
        config.weights.market = 0.36;
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.weights.connections"));
    }

    #[test]
    fn test_invalid_odds_clip() {
        let mut config = ScoringConfig::default();
        config.market_expectation.odds_min = 5.0;
        config.market_expectation.odds_max = 2.0;
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("odds_min"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ScoringConfig::default();
        config.weights.form = 0.5; // Error 1: sum
        config.freshness.optimal_min_days = 40; // Error 2: inverted window
        config.trainer_rtf.cold = 50.0; // Error 3: cold above hot
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_freshness_window_inside_quick_turnaround() {
        let mut config = ScoringConfig::default();
        config.freshness.optimal_min_days = 3;
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("7 <= optimal_min_days"));

        config.freshness.optimal_min_days = 7;
        assert!(validate_scoring(&config).is_ok());
    }
}

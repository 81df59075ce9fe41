use serde::{Deserialize, Serialize};

use super::components::{round1, Component};
use super::ranking::ScoredEntrant;

/// Score margin or market gap at which a pick is considered clear.
pub const STRONG_SEPARATION: f64 = 8.0;
/// Lower bound of a moderate separation.
pub const MODERATE_SEPARATION: f64 = 4.0;

/// Ordered LOW < MED < HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MED")]
    Med,
    #[serde(rename = "HIGH")]
    High,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Band::Low => "LOW",
            Band::Med => "MED",
            Band::High => "HIGH",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    pub band: Band,
    /// Total-score gap between rank 1 and rank 2
    pub margin: f64,
    /// Field-normalized implied probability gap (percentage points)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_gap: Option<f64>,
    pub reasons: Vec<String>,
}

/// Components needed for "majority" coverage.
pub fn majority_components() -> usize {
    Component::ALL.len() / 2 + 1
}

/// Implied probabilities re-normalized across every entrant with odds, in
/// percent, indexed like `ranked`.
pub fn normalized_market_probabilities(ranked: &[ScoredEntrant]) -> Vec<Option<f64>> {
    let overround: f64 = ranked
        .iter()
        .filter_map(|s| s.entrant.usable_odds())
        .map(|o| 1.0 / o)
        .sum();
    ranked
        .iter()
        .map(|s| {
            s.entrant
                .usable_odds()
                .filter(|_| overround > 0.0)
                .map(|o| (1.0 / o) / overround * 100.0)
        })
        .collect()
}

/// Classify how trustworthy the top pick of a ranked field is.
///
/// `ranked` must already be in rank order.
pub fn assess_confidence(ranked: &[ScoredEntrant]) -> ConfidenceAssessment {
    if ranked.len() < 2 {
        return ConfidenceAssessment {
            band: Band::Low,
            margin: 0.0,
            market_gap: None,
            reasons: vec![format!("Insufficient entrants: {} scored", ranked.len())],
        };
    }

    let top = &ranked[0];
    let second = &ranked[1];
    let margin = round1(top.total_score - second.total_score);

    let probabilities = normalized_market_probabilities(ranked);
    let market_gap = match (probabilities[0], probabilities[1]) {
        (Some(first), Some(runner_up)) => Some(round1(first - runner_up)),
        _ => None,
    };

    let has_market = top.entrant.usable_odds().is_some();
    let present = top.scored_components();
    let total = Component::ALL.len();
    let majority = present >= majority_components();

    let strong = margin >= STRONG_SEPARATION || market_gap.is_some_and(|g| g >= STRONG_SEPARATION);
    let moderate = (MODERATE_SEPARATION..STRONG_SEPARATION).contains(&margin)
        || market_gap.is_some_and(|g| (MODERATE_SEPARATION..STRONG_SEPARATION).contains(&g));

    let margin_reason = |qualifier: &str| format!("{} margin of {} pts between 1st and 2nd", qualifier, margin);
    let gap_reason = market_gap.map(|g| format!("Market probability gap of {} pp", g));
    let coverage_reason = format!("{}/{} scoring components available", present, total);

    let mut reasons = Vec::new();
    let band = if has_market && strong && majority {
        reasons.push(margin_reason("Clear"));
        reasons.extend(gap_reason);
        reasons.push(coverage_reason);
        reasons.push("Odds data present".to_string());
        Band::High
    } else if has_market && (moderate || !majority) {
        let qualifier = if strong {
            "Clear"
        } else if moderate {
            "Moderate"
        } else {
            "Narrow"
        };
        reasons.push(margin_reason(qualifier));
        reasons.extend(gap_reason);
        if majority {
            reasons.push(coverage_reason);
        } else {
            reasons.push(format!(
                "Only {}/{} scoring components available (below majority of {})",
                present,
                total,
                majority_components()
            ));
        }
        reasons.push("Odds data present".to_string());
        Band::Med
    } else {
        if !has_market {
            reasons.push("No odds data for top pick".to_string());
        }
        reasons.push(margin_reason(if strong { "Clear" } else { "Narrow" }));
        reasons.extend(gap_reason);
        reasons.push(coverage_reason);
        Band::Low
    };

    ConfidenceAssessment {
        band,
        margin,
        market_gap,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::EntrantRecord;
    use crate::scoring::engine::ComponentScore;

    fn components(present: usize) -> Vec<ComponentScore> {
        Component::ALL
            .iter()
            .enumerate()
            .map(|(idx, c)| ComponentScore {
                component: *c,
                score: (idx < present).then_some(50.0),
                weight: 0.0,
                weighted_score: 0.0,
                reason: String::new(),
            })
            .collect()
    }

    fn scored(name: &str, total: f64, odds: Option<f64>, present: usize, rank: u32) -> ScoredEntrant {
        let mut entrant = EntrantRecord::new(name);
        entrant.odds_decimal = odds;
        ScoredEntrant {
            entrant,
            total_score: total,
            rank,
            components: components(present),
            available_weight: 0.0,
        }
    }

    /// Two-horse field where both have identical odds, so only the margin varies
    fn field(margin: f64, odds: Option<f64>, present: usize) -> Vec<ScoredEntrant> {
        vec![
            scored("Top", 60.0 + margin, odds, present, 1),
            scored("Second", 60.0, odds, 6, 2),
        ]
    }

    #[test]
    fn test_single_entrant_is_low() {
        let ranked = vec![scored("Only", 80.0, Some(2.0), 8, 1)];
        let c = assess_confidence(&ranked);
        assert_eq!(c.band, Band::Low);
        assert_eq!(c.margin, 0.0);
        assert!(c.reasons[0].contains("Insufficient entrants"));
    }

    #[test]
    fn test_high_band() {
        let c = assess_confidence(&field(9.0, Some(4.0), 6));
        assert_eq!(c.band, Band::High);
        assert_eq!(c.margin, 9.0);
        assert_eq!(c.market_gap, Some(0.0));
        assert!(c.reasons.iter().any(|r| r.contains("9 pts")));
        assert!(c.reasons.iter().any(|r| r.contains("6/8")));
    }

    #[test]
    fn test_market_gap_alone_gives_high() {
        let ranked = vec![
            scored("Fav", 61.0, Some(2.0), 6, 1),
            scored("Outsider", 60.0, Some(10.0), 6, 2),
        ];
        let c = assess_confidence(&ranked);
        assert_eq!(c.band, Band::High);
        // 0.5 / 0.6 vs 0.1 / 0.6
        assert_eq!(c.market_gap, Some(66.7));
    }

    #[test]
    fn test_moderate_margin_is_med() {
        let c = assess_confidence(&field(5.0, Some(4.0), 6));
        assert_eq!(c.band, Band::Med);
        assert!(c.reasons[0].starts_with("Moderate"));
    }

    #[test]
    fn test_low_coverage_caps_at_med() {
        let c = assess_confidence(&field(20.0, Some(4.0), 3));
        assert_eq!(c.band, Band::Med);
        assert!(c.reasons.iter().any(|r| r.contains("below majority")));
    }

    #[test]
    fn test_no_market_is_low() {
        let c = assess_confidence(&field(20.0, None, 8));
        assert_eq!(c.band, Band::Low);
        assert!(c.market_gap.is_none());
        assert!(c.reasons.iter().any(|r| r.contains("No odds")));
    }

    #[test]
    fn test_narrow_margin_is_low() {
        let c = assess_confidence(&field(1.5, Some(4.0), 8));
        assert_eq!(c.band, Band::Low);
        assert!(c.reasons.iter().any(|r| r.contains("Narrow margin of 1.5")));
    }

    #[test]
    fn test_band_monotonic_in_margin() {
        for (odds, present) in [(Some(4.0), 8), (Some(4.0), 2), (None, 8)] {
            let mut previous = Band::Low;
            for step in 0..=40 {
                let margin = step as f64 * 0.5;
                let band = assess_confidence(&field(margin, odds, present)).band;
                assert!(band >= previous, "band dropped at margin {}", margin);
                previous = band;
            }
        }
    }

    #[test]
    fn test_band_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Band::Med).unwrap(), "\"MED\"");
        assert_eq!(Band::High.to_string(), "HIGH");
    }
}

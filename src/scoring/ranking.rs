use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::engine::{ComponentScore, ScoreResult};
use crate::card::EntrantRecord;

/// An entrant with its score, rank and per-component explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntrant {
    #[serde(flatten)]
    pub entrant: EntrantRecord,
    pub total_score: f64,
    pub rank: u32,
    pub components: Vec<ComponentScore>,
    pub available_weight: f64,
}

impl ScoredEntrant {
    pub fn scored_components(&self) -> usize {
        self.components.iter().filter(|c| c.score.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub name: String,
    pub rank: u32,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Picks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_pick: Option<Pick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_1: Option<Pick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_2: Option<Pick>,
}

/// Ordering used for ranking: total score descending, then name ascending
/// (case-insensitive, then exact), then input position.
fn rank_order(a: &(usize, EntrantRecord, ScoreResult), b: &(usize, EntrantRecord, ScoreResult)) -> Ordering {
    b.2.total_score
        .total_cmp(&a.2.total_score)
        .then_with(|| a.1.name.to_lowercase().cmp(&b.1.name.to_lowercase()))
        .then_with(|| a.1.name.cmp(&b.1.name))
        .then_with(|| a.0.cmp(&b.0))
}

/// Sort scored entrants and assign dense ranks 1..N.
pub fn rank_entrants(scored: Vec<(EntrantRecord, ScoreResult)>) -> Vec<ScoredEntrant> {
    let mut indexed: Vec<_> = scored
        .into_iter()
        .enumerate()
        .map(|(idx, (entrant, result))| (idx, entrant, result))
        .collect();
    indexed.sort_by(rank_order);

    indexed
        .into_iter()
        .enumerate()
        .map(|(pos, (_, entrant, result))| ScoredEntrant {
            entrant,
            total_score: result.total_score,
            rank: pos as u32 + 1,
            components: result.components,
            available_weight: result.available_weight,
        })
        .collect()
}

/// Top pick plus two backups, each present only if the field is big enough.
pub fn select_picks(ranked: &[ScoredEntrant]) -> Picks {
    let pick = |idx: usize| {
        ranked.get(idx).map(|s| Pick {
            name: s.entrant.name.clone(),
            rank: s.rank,
            score: s.total_score,
        })
    };
    Picks {
        top_pick: pick(0),
        backup_1: pick(1),
        backup_2: pick(2),
    }
}

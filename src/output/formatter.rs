use std::io::IsTerminal;
use chrono::Duration;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::report::{BatchReport, EventReport};
use crate::scoring::{Band, ScoredEntrant};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a 0-100 score with one decimal.
/// If incomplete is true, appends asterisk to indicate partial data
pub fn format_score(score: f64, incomplete: bool) -> String {
    if incomplete {
        format!("{:.1}*", score)
    } else {
        format!("{:.1}", score)
    }
}

/// Decimal odds as shown in the table, "-" when absent
pub fn format_odds(odds: Option<f64>) -> String {
    match odds {
        Some(o) => format!("{:.2}", o),
        None => "-".to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// One line describing the event: track, time, distance, going, name
pub fn format_event_header(report: &EventReport, use_colors: bool) -> String {
    let meta = &report.meta;
    let mut parts: Vec<String> = Vec::new();
    if let Some(track) = &meta.track {
        parts.push(track.clone());
    }
    if let Some(off) = &meta.off_time {
        parts.push(off.clone());
    }
    if let Some(distance) = &meta.distance {
        parts.push(distance.clone());
    }
    if let Some(going) = &meta.going {
        parts.push(going.clone());
    }
    let mut header = if parts.is_empty() {
        report.event_id.clone()
    } else {
        parts.join(" | ")
    };
    if let Some(name) = &meta.race_name {
        header = format!("{} - {}", header, name);
    }

    if use_colors {
        header.bold().to_string()
    } else {
        header
    }
}

fn band_label(band: Band, use_colors: bool) -> String {
    let label = band.to_string();
    if !use_colors {
        return label;
    }
    match band {
        Band::High => label.green().bold().to_string(),
        Band::Med => label.yellow().to_string(),
        Band::Low => label.red().to_string(),
    }
}

/// Confidence band plus its first reason
pub fn format_confidence(report: &EventReport, use_colors: bool) -> String {
    let confidence = &report.confidence;
    let reason = confidence.reasons.first().map(String::as_str).unwrap_or("");
    format!("Confidence: {} ({})", band_label(confidence.band, use_colors), reason)
}

/// Format ranked entrants as a table with columns: Rank, Score, Odds, Name
/// Rank column: 3 chars (fits "99."), right-aligned
/// Score column is right-aligned, 6 chars wide (fits "100.0*")
pub fn format_ranked_table(entrants: &[ScoredEntrant], use_colors: bool) -> String {
    if entrants.is_empty() {
        return "No entrants.".to_string();
    }

    let term_width = get_terminal_width();

    let rank_width = 3;
    let score_width = 6;
    let odds_width = 6;
    let separator = "  ";

    entrants
        .iter()
        .map(|scored| {
            let rank_str = format!("{:>2}.", scored.rank);
            let score_str = format_score(scored.total_score, scored.available_weight < 1.0);
            let score_padded = format!("{:>width$}", score_str, width = score_width);
            let odds_padded = format!("{:>width$}", format_odds(scored.entrant.odds_decimal), width = odds_width);

            let fixed_width = rank_width + 1 + score_width + odds_width + separator.len() * 2;
            let name = if let Some(width) = term_width {
                if width > fixed_width + 10 {
                    truncate_name(&scored.entrant.name, width - fixed_width)
                } else {
                    // Very narrow terminal, show truncated
                    truncate_name(&scored.entrant.name, 20)
                }
            } else {
                // No terminal (pipe), don't truncate
                scored.entrant.name.clone()
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    rank_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    odds_padded.cyan(),
                    separator,
                    name
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    rank_str, score_padded, separator, odds_padded, separator, name
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-component breakdown for one entrant (verbose mode)
pub fn format_entrant_detail(scored: &ScoredEntrant, use_colors: bool) -> String {
    let mut lines = Vec::with_capacity(scored.components.len() + 1);
    let title = format!(
        "{}. {}  {}",
        scored.rank,
        scored.entrant.name,
        format_score(scored.total_score, scored.available_weight < 1.0)
    );
    lines.push(if use_colors { title.bold().to_string() } else { title });

    for component in &scored.components {
        let value = match component.score {
            Some(s) => format!("{:>5.1} x {:.3}", s, component.weight),
            None => format!("{:>5}", "-"),
        };
        lines.push(format!(
            "    {:<20}{}  {}",
            component.component.label(),
            value,
            component.reason
        ));
    }
    lines.join("\n")
}

/// Full block for one event: header, table, picks and confidence
pub fn format_event(report: &EventReport, use_colors: bool) -> String {
    let mut out = vec![
        format_event_header(report, use_colors),
        format_ranked_table(&report.entrants, use_colors),
    ];

    let picks: Vec<String> = [&report.picks.top_pick, &report.picks.backup_1, &report.picks.backup_2]
        .into_iter()
        .flatten()
        .map(|p| p.name.clone())
        .collect();
    if !picks.is_empty() {
        out.push(format!("Picks: {}", picks.join(", ")));
    }
    out.push(format_confidence(report, use_colors));
    out.join("\n")
}

/// Every event in the batch followed by the disclaimer
pub fn format_batch(batch: &BatchReport, use_colors: bool) -> String {
    if batch.events.is_empty() {
        return "No events found.".to_string();
    }

    let mut blocks: Vec<String> = batch.events.iter().map(|e| format_event(e, use_colors)).collect();
    blocks.push(crate::report::DISCLAIMER.to_string());
    blocks.join("\n\n")
}

/// Format ranked entrants as tab-separated values for scripting
/// Columns: event_id, rank, score, name (no headers, no colors)
pub fn format_tsv(batch: &BatchReport) -> String {
    batch
        .events
        .iter()
        .flat_map(|event| {
            event.entrants.iter().map(move |scored| {
                format!(
                    "{}\t{}\t{:.1}\t{}",
                    event.event_id, scored.rank, scored.total_score, scored.entrant.name
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{EntrantRecord, EventContext};
    use crate::scoring::{ConfidenceAssessment, Pick, Picks};
    use chrono::Utc;

    fn scored(name: &str, rank: u32, total: f64, odds: Option<f64>) -> ScoredEntrant {
        let mut entrant = EntrantRecord::new(name);
        entrant.odds_decimal = odds;
        ScoredEntrant {
            entrant,
            total_score: total,
            rank,
            components: vec![],
            available_weight: 1.0,
        }
    }

    fn sample_report() -> EventReport {
        EventReport::new(
            "ascot-2026-03-10-14-30".to_string(),
            EventContext {
                track: Some("Ascot".to_string()),
                off_time: Some("14:30".to_string()),
                distance: Some("2m4f".to_string()),
                going: Some("Good to Soft".to_string()),
                ..Default::default()
            },
            vec![scored("Favourite", 1, 72.4, Some(2.5)), scored("Outsider", 2, 41.0, Some(12.0))],
            Picks {
                top_pick: Some(Pick {
                    name: "Favourite".to_string(),
                    rank: 1,
                    score: 72.4,
                }),
                backup_1: Some(Pick {
                    name: "Outsider".to_string(),
                    rank: 2,
                    score: 41.0,
                }),
                backup_2: None,
            },
            ConfidenceAssessment {
                band: Band::High,
                margin: 31.4,
                market_gap: Some(55.1),
                reasons: vec!["Clear margin of 31.4 pts between 1st and 2nd".to_string()],
            },
        )
    }

    #[test]
    fn test_format_score_complete() {
        assert_eq!(format_score(56.0, false), "56.0");
    }

    #[test]
    fn test_format_score_with_incomplete() {
        assert_eq!(format_score(61.24, true), "61.2*");
    }

    #[test]
    fn test_format_odds() {
        assert_eq!(format_odds(Some(2.5)), "2.50");
        assert_eq!(format_odds(None), "-");
    }

    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("Short name", 20), "Short name");
    }

    #[test]
    fn test_truncate_name_long() {
        assert_eq!(truncate_name("Extremely Long Horse Name", 15), "Extremely Lo...");
    }

    #[test]
    fn test_truncate_name_very_narrow() {
        assert_eq!(truncate_name("Hello world", 3), "Hel");
    }

    #[test]
    fn test_event_header() {
        let header = format_event_header(&sample_report(), false);
        assert_eq!(header, "Ascot | 14:30 | 2m4f | Good to Soft");
    }

    #[test]
    fn test_event_header_falls_back_to_id() {
        let mut report = sample_report();
        report.meta = EventContext::default();
        assert_eq!(format_event_header(&report, false), "ascot-2026-03-10-14-30");
    }

    #[test]
    fn test_ranked_table_rows() {
        let report = sample_report();
        let table = format_ranked_table(&report.entrants, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 1."));
        assert!(lines[0].contains("72.4"));
        assert!(lines[0].contains("2.50"));
        assert!(lines[0].contains("Favourite"));
        assert!(lines[1].starts_with(" 2."));
    }

    #[test]
    fn test_ranked_table_marks_partial_data() {
        let mut entrant = scored("Sparse", 1, 56.0, Some(2.5));
        entrant.available_weight = 0.3;
        let table = format_ranked_table(&[entrant], false);
        assert!(table.contains("56.0*"));
    }

    #[test]
    fn test_ranked_table_empty() {
        assert_eq!(format_ranked_table(&[], false), "No entrants.");
    }

    #[test]
    fn test_format_event_includes_picks_and_confidence() {
        let block = format_event(&sample_report(), false);
        assert!(block.contains("Picks: Favourite, Outsider"));
        assert!(block.contains("Confidence: HIGH (Clear margin"));
    }

    #[test]
    fn test_format_batch_appends_disclaimer() {
        let batch = BatchReport::new("2026-03-10", Utc::now(), vec![sample_report()]);
        let out = format_batch(&batch, false);
        assert!(out.ends_with(crate::report::DISCLAIMER));
    }

    #[test]
    fn test_format_batch_empty() {
        let batch = BatchReport::new("2026-03-10", Utc::now(), vec![]);
        assert_eq!(format_batch(&batch, false), "No events found.");
    }

    #[test]
    fn test_format_tsv() {
        let batch = BatchReport::new("2026-03-10", Utc::now(), vec![sample_report()]);
        let tsv = format_tsv(&batch);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ascot-2026-03-10-14-30\t1\t72.4\tFavourite");
        assert_eq!(lines[1].split('\t').count(), 4);
    }

    #[test]
    fn test_format_age_minutes() {
        assert_eq!(format_age(Duration::minutes(30)), "30m");
    }

    #[test]
    fn test_format_age_now() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }

    #[test]
    fn test_format_age_hours() {
        assert_eq!(format_age(Duration::hours(3)), "3h");
    }
}

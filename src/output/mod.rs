pub mod formatter;

pub use formatter::{
    format_age, format_batch, format_confidence, format_entrant_detail, format_event, format_event_header,
    format_odds, format_ranked_table, format_score, format_tsv, should_use_colors,
};

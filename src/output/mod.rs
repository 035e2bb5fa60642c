pub mod formatter;

pub use formatter::{
    format_age, format_event_detail, format_event_list, format_house_table, format_player_table,
    format_standings_tsv, should_use_colors,
};

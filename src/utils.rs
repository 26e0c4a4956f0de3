//! Utility functions for the rating engine

use crate::types::PuzzleId;
use chrono::{DateTime, Days, NaiveDate, Utc};

/// Date of puzzle 0
pub fn series_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 19).unwrap_or(NaiveDate::MIN)
}

/// Puzzle played on the given date (dates before the epoch map to 0)
pub fn puzzle_for_date(date: NaiveDate) -> PuzzleId {
    let days = (date - series_epoch()).num_days().max(0);
    PuzzleId(u32::try_from(days).unwrap_or(u32::MAX))
}

/// Date on which the given puzzle was played
pub fn date_for_puzzle(puzzle: PuzzleId) -> Option<NaiveDate> {
    series_epoch().checked_add_days(Days::new(u64::from(puzzle.value())))
}

/// Puzzle of the current UTC day
pub fn todays_puzzle() -> PuzzleId {
    puzzle_for_date(current_timestamp().date_naive())
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

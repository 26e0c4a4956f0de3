//! Daily and weekly standings built from rated submissions
//!
//! Reports only read the snapshots that rating batches recorded, so they
//! describe the state right after each day was rated regardless of what
//! happened afterwards.

use crate::types::{Attempts, PlayerId, PuzzleId, Submission};
use crate::utils::date_for_puzzle;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// One row of a daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub attempts: Attempts,
    pub elo: f64,
    pub elo_delta: f64,
    pub ordinal: f64,
    pub ordinal_delta: f64,
}

/// One row of a weekly report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub days_played: usize,
    pub average_attempts: f64,
    pub start_elo: f64,
    pub end_elo: f64,
    pub start_ordinal: f64,
    pub end_ordinal: f64,
}

impl WeeklyStanding {
    pub fn elo_change(&self) -> f64 {
        self.end_elo - self.start_elo
    }

    pub fn ordinal_change(&self) -> f64 {
        self.end_ordinal - self.start_ordinal
    }
}

fn display_name(names: &HashMap<PlayerId, String>, player_id: &PlayerId) -> String {
    names
        .get(player_id)
        .cloned()
        .unwrap_or_else(|| player_id.clone())
}

fn by_ordinal_desc(a: (f64, &PlayerId), b: (f64, &PlayerId)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Standings for one rated puzzle, best ordinal first
///
/// Submissions without a snapshot (unrated or normal mode) are ignored.
pub fn daily_standings(
    submissions: &[Submission],
    names: &HashMap<PlayerId, String>,
) -> Vec<DailyStanding> {
    let mut rows: Vec<DailyStanding> = submissions
        .iter()
        .filter_map(|submission| {
            let snapshot = submission.snapshot?;
            Some(DailyStanding {
                player_id: submission.player_id.clone(),
                name: display_name(names, &submission.player_id),
                attempts: submission.attempts,
                elo: snapshot.elo,
                elo_delta: snapshot.elo_delta,
                ordinal: snapshot.ordinal,
                ordinal_delta: snapshot.ordinal_delta,
            })
        })
        .collect();

    rows.sort_by(|a, b| by_ordinal_desc((a.ordinal, &a.player_id), (b.ordinal, &b.player_id)));
    rows
}

/// Standings over a range of puzzles, best final ordinal first
///
/// Start values are the ratings held before the first rated day in the
/// range, end values the ratings after the last one.
pub fn weekly_standings(
    submissions: &[Submission],
    names: &HashMap<PlayerId, String>,
) -> Vec<WeeklyStanding> {
    let mut per_player: BTreeMap<&PlayerId, Vec<&Submission>> = BTreeMap::new();
    for submission in submissions.iter().filter(|s| s.snapshot.is_some()) {
        per_player
            .entry(&submission.player_id)
            .or_default()
            .push(submission);
    }

    let mut rows: Vec<WeeklyStanding> = per_player
        .into_iter()
        .filter_map(|(player_id, mut played)| {
            played.sort_by_key(|s| s.puzzle);
            let first = played.first()?.snapshot?;
            let last = played.last()?.snapshot?;
            let total_attempts: u32 = played.iter().map(|s| u32::from(s.attempts.count())).sum();

            Some(WeeklyStanding {
                player_id: player_id.clone(),
                name: display_name(names, player_id),
                days_played: played.len(),
                average_attempts: f64::from(total_attempts) / played.len() as f64,
                start_elo: first.prior_elo(),
                end_elo: last.elo,
                start_ordinal: first.prior_ordinal(),
                end_ordinal: last.ordinal,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        by_ordinal_desc((a.end_ordinal, &a.player_id), (b.end_ordinal, &b.player_id))
    });
    rows
}

/// Plain-text table for a daily report
pub fn render_daily(puzzle: PuzzleId, rows: &[DailyStanding]) -> String {
    let mut out = String::new();
    let _ = write!(out, "Wordle #{} daily standings", puzzle);
    if let Some(date) = date_for_puzzle(puzzle) {
        let _ = write!(out, " ({})", date);
    }
    let _ = writeln!(out);
    if rows.is_empty() {
        let _ = write!(out, "No rated submissions.");
        return out;
    }

    for (position, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<20} {}  elo {:>9.3} ({:+.3})  ordinal {:>7.3} ({:+.3})",
            position + 1,
            row.name,
            row.attempts,
            row.elo,
            row.elo_delta,
            row.ordinal,
            row.ordinal_delta
        );
    }
    out.trim_end().to_string()
}

/// Plain-text table for a weekly report
pub fn render_weekly(start: PuzzleId, end: PuzzleId, rows: &[WeeklyStanding]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Wordle #{} to #{} weekly standings", start, end);
    if rows.is_empty() {
        let _ = write!(out, "No rated submissions.");
        return out;
    }

    for (position, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<20} {} days, avg {:.2}  elo {:.3} -> {:.3} ({:+.3})  ordinal {:.3} -> {:.3} ({:+.3})",
            position + 1,
            row.name,
            row.days_played,
            row.average_attempts,
            row.start_elo,
            row.end_elo,
            row.elo_change(),
            row.start_ordinal,
            row.end_ordinal,
            row.ordinal_change()
        );
    }
    out.trim_end().to_string()
}

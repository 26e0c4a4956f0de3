//! Narrated breakdown of a player's Elo change for one puzzle
//!
//! The narrative is rendered from the same `PairwiseRound` the daily batch
//! uses, so its final rating always matches what the batch persists for the
//! same snapshot.

use crate::rating::elo::PairwiseRound;
use crate::types::{PlayerId, PuzzleId};
use std::collections::HashMap;
use std::fmt::Write;

/// Message returned when the player has no rated submission for the puzzle
pub fn did_not_play(player_id: &str, puzzle: PuzzleId) -> String {
    format!("{} did not play Wordle #{}!", player_id, puzzle)
}

/// Render the comparison-by-comparison breakdown for one player
///
/// `names` maps player ids to display names; ids without an entry are shown
/// as they are.
pub fn narrate(
    round: &PairwiseRound<'_>,
    player_id: &PlayerId,
    puzzle: PuzzleId,
    names: &HashMap<PlayerId, String>,
) -> String {
    let Some(index) = round.position(player_id) else {
        return did_not_play(player_id, puzzle);
    };
    let Some(change) = round.change_for(index) else {
        return did_not_play(player_id, puzzle);
    };

    let name_of = |id: &PlayerId| names.get(id).cloned().unwrap_or_else(|| id.clone());
    let name = name_of(player_id);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analysis of {}'s performance in Wordle #{}:",
        name, puzzle
    );
    let _ = writeln!(out);
    let _ = write!(out, "{} started with an Elo of {:.3}", name, change.old_elo);

    for comparison in round.comparisons_for(index) {
        let _ = write!(
            out,
            "\n\t{} against {}. Elo change: {:+.3}",
            comparison.outcome,
            name_of(&comparison.opponent),
            comparison.delta
        );
    }

    let _ = write!(
        out,
        "\n\nIn total {}'s Elo changed by {:+.3}, bringing their new Elo rating to: {:.3}",
        name, change.elo_delta, change.new_elo
    );

    out
}

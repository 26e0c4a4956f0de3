//! Pairwise Elo over a virtual round-robin
//!
//! A day's ranking is expanded into every ordered pair of participants: a
//! higher score beats a lower one, equal scores draw. Each pair produces a
//! classical two-player Elo delta and a player's change for the day is the
//! sum of its deltas.
//!
//! Every comparison reads the ratings captured when the round was built.
//! Deltas are never fed back into the round, so the result does not depend
//! on the order participants are listed in.

use crate::config::RatingConfig;
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Probability that a player rated `rating` beats one rated `opponent`
pub fn expected_score(rating: f64, opponent: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / scale))
}

/// Elo change for one comparison given the actual result (1, 0.5 or 0)
pub fn pairwise_delta(rating: f64, opponent: f64, actual: f64, config: &RatingConfig) -> f64 {
    config.k_factor * (actual - expected_score(rating, opponent, config.elo_scale))
}

/// Result of one virtual game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Tie,
    Loss,
}

impl Outcome {
    fn between(score: u32, opponent_score: u32) -> Self {
        match score.cmp(&opponent_score) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Equal => Outcome::Tie,
            std::cmp::Ordering::Less => Outcome::Loss,
        }
    }

    /// Actual score fed into the Elo formula
    pub fn actual(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Tie => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "Won"),
            Outcome::Tie => write!(f, "Tied"),
            Outcome::Loss => write!(f, "Lost"),
        }
    }
}

/// A participant as seen at the start of the batch
#[derive(Debug, Clone, PartialEq)]
pub struct EloParticipant {
    pub player_id: PlayerId,
    pub score: u32,
    pub elo: f64,
}

/// One pairing from a participant's point of view
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub opponent: PlayerId,
    pub opponent_elo: f64,
    pub outcome: Outcome,
    pub delta: f64,
}

/// Elo result for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloChange {
    pub player_id: PlayerId,
    pub old_elo: f64,
    pub new_elo: f64,
    pub elo_delta: f64,
}

/// All comparisons of one puzzle day
#[derive(Debug)]
pub struct PairwiseRound<'a> {
    config: &'a RatingConfig,
    participants: Vec<EloParticipant>,
    /// Participant indices grouped by score, lowest score first
    buckets: BTreeMap<u32, Vec<usize>>,
}

impl<'a> PairwiseRound<'a> {
    pub fn new(participants: Vec<EloParticipant>, config: &'a RatingConfig) -> Self {
        let mut buckets: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (index, participant) in participants.iter().enumerate() {
            buckets.entry(participant.score).or_default().push(index);
        }

        Self {
            config,
            participants,
            buckets,
        }
    }

    /// Find a participant by player id
    pub fn position(&self, player_id: &str) -> Option<usize> {
        self.participants
            .iter()
            .position(|p| p.player_id == player_id)
    }

    /// Every comparison for the participant at `index`
    ///
    /// Opponents are listed from the lowest score up, so wins come first,
    /// then ties, then losses. The participant itself is skipped.
    pub fn comparisons_for(&self, index: usize) -> Vec<Comparison> {
        let Some(player) = self.participants.get(index) else {
            return Vec::new();
        };

        self.buckets
            .values()
            .flatten()
            .filter(|&&opponent_index| opponent_index != index)
            .map(|&opponent_index| {
                let opponent = &self.participants[opponent_index];
                let outcome = Outcome::between(player.score, opponent.score);
                Comparison {
                    opponent: opponent.player_id.clone(),
                    opponent_elo: opponent.elo,
                    outcome,
                    delta: pairwise_delta(player.elo, opponent.elo, outcome.actual(), self.config),
                }
            })
            .collect()
    }

    /// Elo change of the participant at `index`
    pub fn change_for(&self, index: usize) -> Option<EloChange> {
        let player = self.participants.get(index)?;

        let elo_delta = if self.participants.len() < 2 {
            0.0
        } else {
            self.comparisons_for(index).iter().map(|c| c.delta).sum()
        };

        Some(EloChange {
            player_id: player.player_id.clone(),
            old_elo: player.elo,
            new_elo: player.elo + elo_delta,
            elo_delta,
        })
    }

    /// Elo changes of all participants, in input order
    pub fn changes(&self) -> Vec<EloChange> {
        (0..self.participants.len())
            .filter_map(|index| self.change_for(index))
            .collect()
    }
}

//! Common types used throughout the rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::WengLinRating;
use std::fmt;
use uuid::Uuid;

/// Stable identifier for players
pub type PlayerId = String;

/// Unique identifier for a score submission
pub type SubmissionId = Uuid;

/// Highest number of guesses a puzzle allows
pub const MAX_ATTEMPTS: u8 = 6;

/// Puzzle number, i.e. days since the series epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleId(pub u32);

impl PuzzleId {
    pub fn value(self) -> u32 {
        self.0
    }

    /// Puzzle `days` before this one, saturating at the epoch
    pub fn saturating_sub(self, days: u32) -> Self {
        Self(self.0.saturating_sub(days))
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Guess count of a solved puzzle, always within `1..=6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guesses(u8);

impl Guesses {
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Number of guesses a player needed
///
/// Serialized as a plain integer where 7 means the puzzle was failed.
/// Solved results are only built through [`Attempts::solved`] or
/// `TryFrom<u8>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Attempts {
    Solved(Guesses),
    Failed,
}

impl Attempts {
    /// Build a solved result, `None` when outside `1..=6`
    pub fn solved(guesses: u8) -> Option<Self> {
        (1..=MAX_ATTEMPTS)
            .contains(&guesses)
            .then_some(Self::Solved(Guesses(guesses)))
    }

    /// Guess count with a failure counted as one past the limit
    pub fn count(self) -> u8 {
        match self {
            Attempts::Solved(guesses) => guesses.get(),
            Attempts::Failed => MAX_ATTEMPTS + 1,
        }
    }

    /// Normalized score in `0..=6`, higher is better
    pub fn calculated_score(self) -> u32 {
        u32::from(MAX_ATTEMPTS + 1 - self.count())
    }
}

impl TryFrom<u8> for Attempts {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value == MAX_ATTEMPTS + 1 {
            return Ok(Attempts::Failed);
        }
        Attempts::solved(value).ok_or_else(|| format!("attempts out of range: {}", value))
    }
}

impl From<Attempts> for u8 {
    fn from(attempts: Attempts) -> Self {
        attempts.count()
    }
}

impl fmt::Display for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempts::Solved(guesses) => write!(f, "{}/{}", guesses.get(), MAX_ATTEMPTS),
            Attempts::Failed => write!(f, "X/{}", MAX_ATTEMPTS),
        }
    }
}

/// Bayesian skill estimate (mean and uncertainty)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillRating {
    pub mu: f64,
    pub sigma: f64,
}

impl From<WengLinRating> for SkillRating {
    fn from(rating: WengLinRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<SkillRating> for WengLinRating {
    fn from(rating: SkillRating) -> Self {
        Self {
            rating: rating.mu,
            uncertainty: rating.sigma,
        }
    }
}

/// Current rating state of a player under both systems
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingState {
    pub elo: f64,
    pub mu: f64,
    pub sigma: f64,
    pub ordinal: f64,
}

impl RatingState {
    pub fn new(elo: f64, skill: SkillRating, ordinal: f64) -> Self {
        Self {
            elo,
            mu: skill.mu,
            sigma: skill.sigma,
            ordinal,
        }
    }

    pub fn skill(&self) -> SkillRating {
        SkillRating {
            mu: self.mu,
            sigma: self.sigma,
        }
    }
}

/// Deltas applied by the most recent batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingDelta {
    pub elo_delta: f64,
    pub ordinal_delta: f64,
}

/// A registered player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub platform: String,
    pub rating: RatingState,
    pub last_delta: RatingDelta,
    pub registered_at: DateTime<Utc>,
}

impl Player {
    pub fn new(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        platform: impl Into<String>,
        rating: RatingState,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform: platform.into(),
            rating,
            last_delta: RatingDelta::default(),
            registered_at: Utc::now(),
        }
    }
}

/// Rating values recorded on a submission once its day has been rated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub elo: f64,
    pub mu: f64,
    pub sigma: f64,
    pub ordinal: f64,
    pub elo_delta: f64,
    pub ordinal_delta: f64,
}

impl ScoreSnapshot {
    pub fn new(rating: RatingState, delta: RatingDelta) -> Self {
        Self {
            elo: rating.elo,
            mu: rating.mu,
            sigma: rating.sigma,
            ordinal: rating.ordinal,
            elo_delta: delta.elo_delta,
            ordinal_delta: delta.ordinal_delta,
        }
    }

    /// Elo the player held before this day was rated
    pub fn prior_elo(&self) -> f64 {
        self.elo - self.elo_delta
    }

    /// Ordinal the player held before this day was rated
    pub fn prior_ordinal(&self) -> f64 {
        self.ordinal - self.ordinal_delta
    }
}

/// One player's result for one puzzle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub player_id: PlayerId,
    pub puzzle: PuzzleId,
    pub raw_text: String,
    pub attempts: Attempts,
    pub hard_mode: bool,
    pub submitted_at: DateTime<Utc>,
    pub snapshot: Option<ScoreSnapshot>,
}

impl Submission {
    pub fn new(
        player_id: impl Into<PlayerId>,
        puzzle: PuzzleId,
        attempts: Attempts,
        hard_mode: bool,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            puzzle,
            raw_text: raw_text.into(),
            attempts,
            hard_mode,
            submitted_at: Utc::now(),
            snapshot: None,
        }
    }

    pub fn calculated_score(&self) -> u32 {
        self.attempts.calculated_score()
    }
}

/// Audit row written back to a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionSnapshot {
    pub submission_id: SubmissionId,
    pub snapshot: ScoreSnapshot,
}

/// New current rating for a player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub rating: RatingState,
    pub delta: RatingDelta,
}

/// Everything one puzzle day writes, committed all-or-nothing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingBatch {
    pub puzzle: PuzzleId,
    pub submissions: Vec<SubmissionSnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

/// Outcome of a daily rating computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ComputationStatus {
    Computed { players: usize },
    SkippedSingleParticipant,
    SkippedEmpty,
    AlreadyComputed,
}

impl ComputationStatus {
    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ComputationStatus::Computed { .. } => "computed",
            ComputationStatus::SkippedSingleParticipant => "skipped_single_participant",
            ComputationStatus::SkippedEmpty => "skipped_empty",
            ComputationStatus::AlreadyComputed => "already_computed",
        }
    }
}

impl fmt::Display for ComputationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationStatus::Computed { players } => write!(f, "computed ({} players)", players),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// One row of a daily leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub player_id: PlayerId,
    pub hard_mode: bool,
    pub calculated_score: u32,
    pub rank: u32,
}

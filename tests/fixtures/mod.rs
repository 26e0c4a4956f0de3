//! Test fixtures and fake implementations for integration testing

use ranked_wordle::config::AppConfig;
use ranked_wordle::error::{RankedError, Result};
use ranked_wordle::rating::calculator::{SkillModel, SkillTeam};
use ranked_wordle::rating::storage::{InMemoryRatingStore, RatingStore};
use ranked_wordle::rating::weng_lin::{ExtendedWengLinConfig, WengLinSkillModel};
use ranked_wordle::types::{
    Player, PlayerId, PuzzleId, RatingBatch, RatingState, SkillRating, Submission,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Configuration pointing at a data file inside `dir`
pub fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.service.data_file = dir.join("ratings.json");
    config
}

/// Share text as the game produces it; `None` guesses means a failed puzzle
pub fn share(puzzle: u32, guesses: Option<u8>, hard_mode: bool) -> String {
    let result = guesses.map_or_else(|| "X".to_string(), |g| g.to_string());
    let star = if hard_mode { "*" } else { "" };
    format!("Wordle {} {}/6{}\n\n🟩🟩🟩🟩🟩", group_thousands(puzzle), result, star)
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Store that rejects the first `failures` batch writes
pub struct FlakyStore {
    inner: InMemoryRatingStore,
    failures_left: Mutex<usize>,
}

impl FlakyStore {
    pub fn new(initial: RatingState, failures: usize) -> Self {
        Self {
            inner: InMemoryRatingStore::new(initial),
            failures_left: Mutex::new(failures),
        }
    }
}

impl RatingStore for FlakyStore {
    fn initial_rating(&self) -> RatingState {
        self.inner.initial_rating()
    }

    fn player_rating(&self, player_id: &PlayerId) -> Result<RatingState> {
        self.inner.player_rating(player_id)
    }

    fn player(&self, player_id: &PlayerId) -> Result<Option<Player>> {
        self.inner.player(player_id)
    }

    fn players(&self) -> Result<Vec<Player>> {
        self.inner.players()
    }

    fn register_player(&self, player: Player) -> Result<()> {
        self.inner.register_player(player)
    }

    fn add_submission(&self, submission: Submission) -> Result<()> {
        self.inner.add_submission(submission)
    }

    fn submissions(&self, puzzle: PuzzleId, hard_mode_only: bool) -> Result<Vec<Submission>> {
        self.inner.submissions(puzzle, hard_mode_only)
    }

    fn submissions_between(&self, start: PuzzleId, end: PuzzleId) -> Result<Vec<Submission>> {
        self.inner.submissions_between(start, end)
    }

    fn is_computed(&self, puzzle: PuzzleId) -> Result<bool> {
        self.inner.is_computed(puzzle)
    }

    fn persist_batch(&self, batch: RatingBatch) -> Result<()> {
        if let Ok(mut left) = self.failures_left.lock() {
            if *left > 0 {
                *left -= 1;
                return Err(RankedError::StorageWriteFailure {
                    message: "disk full".to_string(),
                }
                .into());
            }
        }
        self.inner.persist_batch(batch)
    }
}

/// Weng-Lin model that counts how often it is consulted
pub struct CountingModel {
    inner: WengLinSkillModel,
    calls: AtomicUsize,
}

impl CountingModel {
    pub fn new() -> Self {
        Self {
            inner: WengLinSkillModel::new(ExtendedWengLinConfig::default())
                .expect("default Weng-Lin config is valid"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SkillModel for CountingModel {
    fn rate(&self, teams: &[SkillTeam], scores: &[u32]) -> Result<Vec<Vec<SkillRating>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rate(teams, scores)
    }

    fn default_rating(&self) -> SkillRating {
        self.inner.default_rating()
    }

    fn ordinal(&self, rating: &SkillRating) -> f64 {
        self.inner.ordinal(rating)
    }

    fn config(&self) -> serde_json::Value {
        self.inner.config()
    }
}

//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving players,
//! submissions and rated puzzle days. Writes are all-or-nothing: a batch is
//! applied to a staged copy of the state, optionally written to disk, and
//! only then published. File-backed stores can be shared between processes.

use crate::error::RankedError;
use crate::types::{
    Player, PlayerId, PuzzleId, RatingBatch, RatingState, Submission,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Platform tag given to players first seen through a submission
pub const UNREGISTERED_PLATFORM: &str = "unregistered";

/// Trait for rating storage operations
pub trait RatingStore: Send + Sync {
    /// Rating given to players the store has never seen
    fn initial_rating(&self) -> RatingState;

    /// Current rating of a player, the initial rating if unknown
    fn player_rating(&self, player_id: &PlayerId) -> crate::error::Result<RatingState>;

    /// Get a registered player
    fn player(&self, player_id: &PlayerId) -> crate::error::Result<Option<Player>>;

    /// Get all players
    fn players(&self) -> crate::error::Result<Vec<Player>>;

    /// Register a new player
    fn register_player(&self, player: Player) -> crate::error::Result<()>;

    /// Record a submission, keeping the first one per player and puzzle
    fn add_submission(&self, submission: Submission) -> crate::error::Result<()>;

    /// Submissions for a puzzle in the order they arrived
    fn submissions(
        &self,
        puzzle: PuzzleId,
        hard_mode_only: bool,
    ) -> crate::error::Result<Vec<Submission>>;

    /// Submissions for an inclusive range of puzzles
    fn submissions_between(
        &self,
        start: PuzzleId,
        end: PuzzleId,
    ) -> crate::error::Result<Vec<Submission>>;

    /// Whether a batch has already been committed for this puzzle
    fn is_computed(&self, puzzle: PuzzleId) -> crate::error::Result<bool>;

    /// Commit a day's ratings atomically
    fn persist_batch(&self, batch: RatingBatch) -> crate::error::Result<()>;
}

/// Everything the store knows, serializable as one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub players: BTreeMap<PlayerId, Player>,
    pub submissions: Vec<Submission>,
    pub computed: BTreeSet<PuzzleId>,
}

impl StoreState {
    fn register_player(&mut self, player: Player) -> crate::error::Result<()> {
        if self.players.contains_key(&player.id) {
            return Err(RankedError::PlayerAlreadyRegistered {
                player_id: player.id,
            }
            .into());
        }
        self.players.insert(player.id.clone(), player);
        Ok(())
    }

    fn add_submission(&mut self, submission: Submission) -> crate::error::Result<()> {
        if self.computed.contains(&submission.puzzle) {
            return Err(RankedError::PuzzleAlreadyRated {
                player_id: submission.player_id,
                puzzle: submission.puzzle.value(),
            }
            .into());
        }

        let duplicate = self
            .submissions
            .iter()
            .any(|s| s.player_id == submission.player_id && s.puzzle == submission.puzzle);
        if duplicate {
            return Err(RankedError::DuplicateSubmission {
                player_id: submission.player_id,
                puzzle: submission.puzzle.value(),
            }
            .into());
        }

        self.submissions.push(submission);
        Ok(())
    }

    fn apply_batch(&mut self, batch: RatingBatch) -> crate::error::Result<()> {
        if !self.computed.insert(batch.puzzle) {
            return Err(RankedError::DuplicateComputation {
                puzzle: batch.puzzle.value(),
            }
            .into());
        }

        for update in batch.submissions {
            let submission = self
                .submissions
                .iter_mut()
                .find(|s| s.id == update.submission_id && s.puzzle == batch.puzzle)
                .ok_or_else(|| RankedError::StorageWriteFailure {
                    message: format!(
                        "submission {} not found for puzzle {}",
                        update.submission_id, batch.puzzle
                    ),
                })?;
            submission.snapshot = Some(update.snapshot);
        }

        for update in batch.players {
            let player = self
                .players
                .entry(update.player_id.clone())
                .or_insert_with(|| {
                    Player::new(
                        update.player_id.clone(),
                        update.player_id.clone(),
                        UNREGISTERED_PLATFORM,
                        update.rating,
                    )
                });
            player.rating = update.rating;
            player.last_delta = update.delta;
        }

        Ok(())
    }
}

/// In-memory rating store, optionally mirrored to a JSON file
///
/// When file-backed, several processes may share the same data file. Reads
/// reload the file and every commit runs under an exclusive lock on a
/// sidecar `.lock` file against freshly read state.
#[derive(Debug)]
pub struct InMemoryRatingStore {
    state: RwLock<StoreState>,
    initial: RatingState,
    path: Option<PathBuf>,
}

impl InMemoryRatingStore {
    /// Create an empty store that lives only in memory
    pub fn new(initial: RatingState) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            initial,
            path: None,
        }
    }

    /// Open a store backed by a JSON file, starting empty if the file is missing
    pub fn open(path: impl Into<PathBuf>, initial: RatingState) -> crate::error::Result<Self> {
        let path = path.into();
        let state = match load_state(&path)? {
            Some(state) => state,
            None => {
                debug!("No data file at {}, starting empty", path.display());
                StoreState::default()
            }
        };

        Ok(Self {
            state: RwLock::new(state),
            initial,
            path: Some(path),
        })
    }

    fn read(&self) -> crate::error::Result<std::sync::RwLockReadGuard<'_, StoreState>> {
        if let Some(path) = &self.path {
            if let Some(fresh) = load_state(path)? {
                *self.write_guard()? = fresh;
            }
        }

        self.state.read().map_err(|_| {
            RankedError::InternalError {
                message: "Failed to acquire store read lock".to_string(),
            }
            .into()
        })
    }

    fn write_guard(&self) -> crate::error::Result<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| {
            RankedError::InternalError {
                message: "Failed to acquire store write lock".to_string(),
            }
            .into()
        })
    }

    /// Apply a change to a staged copy and publish it only if everything succeeds
    fn commit<F>(&self, change: F) -> crate::error::Result<()>
    where
        F: FnOnce(&mut StoreState) -> crate::error::Result<()>,
    {
        let mut state = self.write_guard()?;

        let Some(path) = &self.path else {
            let mut staged = (*state).clone();
            change(&mut staged)?;
            *state = staged;
            return Ok(());
        };

        let _lock = DataFileLock::acquire(path)?;
        let mut staged = match load_state(path)? {
            Some(fresh) => fresh,
            None => (*state).clone(),
        };
        change(&mut staged)?;
        write_atomically(path, &staged)?;

        *state = staged;
        Ok(())
    }
}

/// Exclusive advisory lock on `<data file>.lock`, released on drop
struct DataFileLock {
    file: File,
}

impl DataFileLock {
    fn acquire(path: &Path) -> crate::error::Result<Self> {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        let lock_path = path.with_file_name(name);

        let failure = |e: std::io::Error| RankedError::StorageWriteFailure {
            message: format!("{}: {}", lock_path.display(), e),
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(failure)?;
        file.lock_exclusive().map_err(failure)?;
        Ok(Self { file })
    }
}

impl Drop for DataFileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Failed to release data file lock: {}", e);
        }
    }
}

/// Current contents of the data file, `None` if it does not exist yet
fn load_state(path: &Path) -> crate::error::Result<Option<StoreState>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(RankedError::InternalError {
                message: format!("Failed to read {}: {}", path.display(), e),
            }
            .into())
        }
    };

    let state = serde_json::from_slice(&raw).map_err(|e| RankedError::InternalError {
        message: format!("Failed to parse {}: {}", path.display(), e),
    })?;
    Ok(Some(state))
}

fn write_atomically(path: &Path, state: &StoreState) -> crate::error::Result<()> {
    let failure = |e: &dyn std::fmt::Display| RankedError::StorageWriteFailure {
        message: format!("{}: {}", path.display(), e),
    };

    let bytes = serde_json::to_vec_pretty(state).map_err(|e| failure(&e))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| failure(&e))?;
    tmp.write_all(&bytes).map_err(|e| failure(&e))?;
    tmp.as_file().sync_all().map_err(|e| failure(&e))?;
    tmp.persist(path).map_err(|e| {
        warn!("Could not move {} into place", e.file.path().display());
        failure(&e.error)
    })?;

    Ok(())
}

impl RatingStore for InMemoryRatingStore {
    fn initial_rating(&self) -> RatingState {
        self.initial
    }

    fn player_rating(&self, player_id: &PlayerId) -> crate::error::Result<RatingState> {
        Ok(self
            .read()?
            .players
            .get(player_id)
            .map(|p| p.rating)
            .unwrap_or(self.initial))
    }

    fn player(&self, player_id: &PlayerId) -> crate::error::Result<Option<Player>> {
        Ok(self.read()?.players.get(player_id).cloned())
    }

    fn players(&self) -> crate::error::Result<Vec<Player>> {
        Ok(self.read()?.players.values().cloned().collect())
    }

    fn register_player(&self, player: Player) -> crate::error::Result<()> {
        self.commit(|state| state.register_player(player))
    }

    fn add_submission(&self, submission: Submission) -> crate::error::Result<()> {
        self.commit(|state| state.add_submission(submission))
    }

    fn submissions(
        &self,
        puzzle: PuzzleId,
        hard_mode_only: bool,
    ) -> crate::error::Result<Vec<Submission>> {
        Ok(self
            .read()?
            .submissions
            .iter()
            .filter(|s| s.puzzle == puzzle && (s.hard_mode || !hard_mode_only))
            .cloned()
            .collect())
    }

    fn submissions_between(
        &self,
        start: PuzzleId,
        end: PuzzleId,
    ) -> crate::error::Result<Vec<Submission>> {
        Ok(self
            .read()?
            .submissions
            .iter()
            .filter(|s| s.puzzle >= start && s.puzzle <= end)
            .cloned()
            .collect())
    }

    fn is_computed(&self, puzzle: PuzzleId) -> crate::error::Result<bool> {
        Ok(self.read()?.computed.contains(&puzzle))
    }

    fn persist_batch(&self, batch: RatingBatch) -> crate::error::Result<()> {
        let puzzle = batch.puzzle;
        let rows = batch.submissions.len();
        self.commit(|state| state.apply_batch(batch))?;
        debug!("Committed {} submission rows for puzzle {}", rows, puzzle);
        Ok(())
    }
}

/// Mock rating store for testing
///
/// Delegates to an in-memory store, records every batch it is asked to
/// persist and can be told to reject the next ones.
#[derive(Debug)]
pub struct MockRatingStore {
    inner: InMemoryRatingStore,
    batches: Mutex<Vec<RatingBatch>>,
    fail_persist: RwLock<bool>,
}

impl MockRatingStore {
    pub fn new(initial: RatingState) -> Self {
        Self {
            inner: InMemoryRatingStore::new(initial),
            batches: Mutex::new(Vec::new()),
            fail_persist: RwLock::new(false),
        }
    }

    /// Make `persist_batch` fail until switched back
    pub fn set_fail_persist(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_persist.write() {
            *flag = fail;
        }
    }

    /// Get all batches passed to `persist_batch` (for testing)
    pub fn get_batches(&self) -> Vec<RatingBatch> {
        self.batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }
}

impl RatingStore for MockRatingStore {
    fn initial_rating(&self) -> RatingState {
        self.inner.initial_rating()
    }

    fn player_rating(&self, player_id: &PlayerId) -> crate::error::Result<RatingState> {
        self.inner.player_rating(player_id)
    }

    fn player(&self, player_id: &PlayerId) -> crate::error::Result<Option<Player>> {
        self.inner.player(player_id)
    }

    fn players(&self) -> crate::error::Result<Vec<Player>> {
        self.inner.players()
    }

    fn register_player(&self, player: Player) -> crate::error::Result<()> {
        self.inner.register_player(player)
    }

    fn add_submission(&self, submission: Submission) -> crate::error::Result<()> {
        self.inner.add_submission(submission)
    }

    fn submissions(
        &self,
        puzzle: PuzzleId,
        hard_mode_only: bool,
    ) -> crate::error::Result<Vec<Submission>> {
        self.inner.submissions(puzzle, hard_mode_only)
    }

    fn submissions_between(
        &self,
        start: PuzzleId,
        end: PuzzleId,
    ) -> crate::error::Result<Vec<Submission>> {
        self.inner.submissions_between(start, end)
    }

    fn is_computed(&self, puzzle: PuzzleId) -> crate::error::Result<bool> {
        self.inner.is_computed(puzzle)
    }

    fn persist_batch(&self, batch: RatingBatch) -> crate::error::Result<()> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(batch.clone());
        }

        let fail = self.fail_persist.read().map(|flag| *flag).unwrap_or(false);
        if fail {
            return Err(RankedError::StorageWriteFailure {
                message: "injected failure".to_string(),
            }
            .into());
        }

        self.inner.persist_batch(batch)
    }
}

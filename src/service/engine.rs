//! Rating engine
//!
//! `RatingEngine` owns the store, the skill model and the Elo settings and
//! exposes every operation the CLI drives: daily computation, the audit
//! narrative, leaderboards, score intake and reports.
//!
//! A daily computation reads every prior rating before anything is written
//! and commits the whole day as one `RatingBatch`. Computations of the same
//! puzzle are serialised by a per-puzzle lock; the computed marker stored
//! with the batch turns any repeat into `AlreadyComputed`.

use crate::audit;
use crate::config::{AppConfig, RatingConfig};
use crate::error::RankedError;
use crate::metrics::MetricsCollector;
use crate::ranking::rank_submissions;
use crate::rating::adapter::{SkillChange, SkillParticipant, SkillUpdateAdapter};
use crate::rating::calculator::SkillModel;
use crate::rating::elo::{EloChange, EloParticipant, PairwiseRound};
use crate::rating::storage::{InMemoryRatingStore, RatingStore};
use crate::rating::weng_lin::WengLinSkillModel;
use crate::report::{self, DailyStanding, WeeklyStanding};
use crate::score::parse_score;
use crate::types::{
    ComputationStatus, Player, PlayerId, PlayerSnapshot, PuzzleId, RankedEntry, RatingBatch,
    RatingDelta, RatingState, ScoreSnapshot, Submission, SubmissionSnapshot,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Number of puzzles before the end puzzle a weekly report covers
pub const WEEK_SPAN: u32 = 7;

/// Rating engine shared by every command
pub struct RatingEngine {
    store: Arc<dyn RatingStore>,
    model: Arc<dyn SkillModel>,
    config: RatingConfig,
    metrics: Option<Arc<MetricsCollector>>,
    puzzle_locks: Mutex<HashMap<PuzzleId, Arc<Mutex<()>>>>,
}

impl RatingEngine {
    pub fn new(
        store: Arc<dyn RatingStore>,
        model: Arc<dyn SkillModel>,
        config: RatingConfig,
    ) -> Self {
        Self {
            store,
            model,
            config,
            metrics: None,
            puzzle_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the production engine: Weng-Lin model and the configured data file
    pub fn from_config(config: &AppConfig) -> crate::error::Result<Self> {
        let model = WengLinSkillModel::new(config.skill.clone())?;
        debug!("Skill model config: {}", model.config());
        let initial = initial_rating(&config.rating, &model);
        let store = InMemoryRatingStore::open(&config.service.data_file, initial)?;

        info!(
            "Rating engine ready with data file {}",
            config.service.data_file.display()
        );

        Ok(Self::new(
            Arc::new(store),
            Arc::new(model),
            config.rating.clone(),
        ))
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Rate one puzzle day
    ///
    /// Only hard-mode submissions take part. An empty day writes nothing, a
    /// day with one participant is committed with zero deltas.
    pub fn compute_daily_ratings(
        &self,
        puzzle: PuzzleId,
    ) -> crate::error::Result<ComputationStatus> {
        let timer = self.metrics.as_ref().map(|m| m.start_timer());

        let lock = self.puzzle_lock(puzzle)?;
        let result = match lock.lock() {
            Ok(_guard) => self.compute_locked(puzzle),
            Err(_) => Err(RankedError::InternalError {
                message: format!("Lock for puzzle {} is poisoned", puzzle),
            }
            .into()),
        };

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(status) => {
                    let elapsed = timer.map(|t| t.stop()).unwrap_or_default();
                    metrics.record_computation(status, elapsed);
                }
                Err(e) => metrics.record_batch_failure(failure_kind(e)),
            }
        }

        result
    }

    fn compute_locked(&self, puzzle: PuzzleId) -> crate::error::Result<ComputationStatus> {
        if self.store.is_computed(puzzle)? {
            info!("Puzzle {} already rated, nothing to do", puzzle);
            return Ok(ComputationStatus::AlreadyComputed);
        }

        let submissions = self.store.submissions(puzzle, true)?;
        if submissions.is_empty() {
            info!("No hard-mode submissions for puzzle {}, skipping", puzzle);
            return Ok(ComputationStatus::SkippedEmpty);
        }

        // Snapshot every prior before computing anything
        let priors = submissions
            .iter()
            .map(|s| self.store.player_rating(&s.player_id))
            .collect::<crate::error::Result<Vec<RatingState>>>()?;

        let round = PairwiseRound::new(
            submissions
                .iter()
                .zip(&priors)
                .map(|(submission, prior)| EloParticipant {
                    player_id: submission.player_id.clone(),
                    score: submission.calculated_score(),
                    elo: prior.elo,
                })
                .collect(),
            &self.config,
        );
        let elo_changes = round.changes();

        let skill_participants: Vec<SkillParticipant> = submissions
            .iter()
            .zip(&priors)
            .map(|(submission, prior)| SkillParticipant {
                player_id: submission.player_id.clone(),
                score: submission.calculated_score(),
                prior: prior.skill(),
                prior_ordinal: prior.ordinal,
            })
            .collect();

        let skill_changes = SkillUpdateAdapter::new(self.model.as_ref())
            .apply(&skill_participants)
            .map_err(|e| {
                error!("Skill update for puzzle {} failed: {}", puzzle, e);
                e
            })?;

        let batch = build_batch(puzzle, &submissions, &elo_changes, &skill_changes)?;
        let players = batch.players.len();

        match self.store.persist_batch(batch) {
            Ok(()) => {}
            Err(e) => {
                if let Some(RankedError::DuplicateComputation { .. }) =
                    e.downcast_ref::<RankedError>()
                {
                    warn!("Puzzle {} was rated concurrently, keeping that batch", puzzle);
                    return Ok(ComputationStatus::AlreadyComputed);
                }
                error!("Failed to commit ratings for puzzle {}: {}", puzzle, e);
                return Err(e);
            }
        }

        if players < 2 {
            info!(
                "Puzzle {} had a single participant, marked rated without changes",
                puzzle
            );
            return Ok(ComputationStatus::SkippedSingleParticipant);
        }

        info!("Rated puzzle {} for {} players", puzzle, players);
        Ok(ComputationStatus::Computed { players })
    }

    fn puzzle_lock(&self, puzzle: PuzzleId) -> crate::error::Result<Arc<Mutex<()>>> {
        let mut locks = self
            .puzzle_locks
            .lock()
            .map_err(|_| RankedError::InternalError {
                message: "Failed to acquire puzzle lock table".to_string(),
            })?;
        Ok(locks.entry(puzzle).or_default().clone())
    }

    /// Narrate how a player's Elo moved on a puzzle
    ///
    /// For a rated puzzle the priors recorded with the batch are used, so
    /// the narrative matches what was committed even after later days.
    pub fn explain_player(
        &self,
        player_id: &PlayerId,
        puzzle: PuzzleId,
    ) -> crate::error::Result<String> {
        let submissions = self.store.submissions(puzzle, true)?;
        if !submissions.iter().any(|s| &s.player_id == player_id) {
            return Ok(audit::did_not_play(player_id, puzzle));
        }

        let computed = self.store.is_computed(puzzle)?;
        let participants = submissions
            .iter()
            .map(|submission| -> crate::error::Result<EloParticipant> {
                let elo = match (computed, submission.snapshot) {
                    (true, Some(snapshot)) => snapshot.prior_elo(),
                    _ => self.store.player_rating(&submission.player_id)?.elo,
                };
                Ok(EloParticipant {
                    player_id: submission.player_id.clone(),
                    score: submission.calculated_score(),
                    elo,
                })
            })
            .collect::<crate::error::Result<Vec<_>>>()?;

        let round = PairwiseRound::new(participants, &self.config);
        let names = self.player_names()?;

        debug!(
            "Explaining puzzle {} for {} (rated: {})",
            puzzle, player_id, computed
        );
        Ok(audit::narrate(&round, player_id, puzzle, &names))
    }

    /// Leaderboard of every submission for a puzzle, any mode
    pub fn rank_puzzle(&self, puzzle: PuzzleId) -> crate::error::Result<Vec<RankedEntry>> {
        let submissions = self.store.submissions(puzzle, false)?;
        Ok(rank_submissions(&submissions))
    }

    /// Register a player with the initial rating
    pub fn register_player(
        &self,
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
        platform: impl Into<String>,
    ) -> crate::error::Result<Player> {
        let player = Player::new(player_id, name, platform, self.store.initial_rating());
        self.store.register_player(player.clone())?;

        if let Some(metrics) = &self.metrics {
            metrics.record_registration();
        }
        info!("Registered player {} ({})", player.id, player.platform);
        Ok(player)
    }

    /// Parse a shared result and store it
    pub fn submit_score(
        &self,
        player_id: impl Into<PlayerId>,
        text: &str,
    ) -> crate::error::Result<Submission> {
        let player_id = player_id.into();
        let result = parse_score(text).and_then(|parsed| {
            let submission = Submission::new(
                player_id.clone(),
                parsed.puzzle,
                parsed.attempts,
                parsed.hard_mode,
                text,
            );
            self.store.add_submission(submission.clone())?;
            Ok(submission)
        });

        if let Some(metrics) = &self.metrics {
            metrics.record_submission(submission_outcome(&result));
        }

        match &result {
            Ok(submission) => info!(
                "Accepted {} for Wordle #{} from {}",
                submission.attempts, submission.puzzle, player_id
            ),
            Err(e) => warn!("Rejected submission from {}: {}", player_id, e),
        }
        result
    }

    /// Get a player or fail with `PlayerNotFound`
    pub fn player(&self, player_id: &PlayerId) -> crate::error::Result<Player> {
        self.store.player(player_id)?.ok_or_else(|| {
            RankedError::PlayerNotFound {
                player_id: player_id.clone(),
            }
            .into()
        })
    }

    /// All known players, best ordinal first
    pub fn players(&self) -> crate::error::Result<Vec<Player>> {
        let mut players = self.store.players()?;
        players.sort_by(|a, b| {
            b.rating
                .ordinal
                .total_cmp(&a.rating.ordinal)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(players)
    }

    /// Standings recorded for one rated puzzle
    pub fn daily_summary(&self, puzzle: PuzzleId) -> crate::error::Result<Vec<DailyStanding>> {
        let submissions = self.store.submissions(puzzle, true)?;
        Ok(report::daily_standings(&submissions, &self.player_names()?))
    }

    /// Standings over `[end - WEEK_SPAN, end]`
    pub fn weekly_summary(&self, end: PuzzleId) -> crate::error::Result<Vec<WeeklyStanding>> {
        let submissions = self
            .store
            .submissions_between(end.saturating_sub(WEEK_SPAN), end)?;
        Ok(report::weekly_standings(&submissions, &self.player_names()?))
    }

    fn player_names(&self) -> crate::error::Result<HashMap<PlayerId, String>> {
        Ok(self
            .store
            .players()?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect())
    }
}

/// Rating of a player with no history under the given model
pub fn initial_rating(config: &RatingConfig, model: &dyn SkillModel) -> RatingState {
    let skill = model.default_rating();
    RatingState::new(config.initial_elo, skill, model.ordinal(&skill))
}

fn build_batch(
    puzzle: PuzzleId,
    submissions: &[Submission],
    elo_changes: &[EloChange],
    skill_changes: &[SkillChange],
) -> crate::error::Result<RatingBatch> {
    if elo_changes.len() != submissions.len() || skill_changes.len() != submissions.len() {
        return Err(RankedError::InternalError {
            message: format!(
                "Puzzle {}: {} submissions, {} Elo results, {} skill results",
                puzzle,
                submissions.len(),
                elo_changes.len(),
                skill_changes.len()
            ),
        }
        .into());
    }

    let mut batch = RatingBatch {
        puzzle,
        submissions: Vec::with_capacity(submissions.len()),
        players: Vec::with_capacity(submissions.len()),
    };

    for ((submission, elo), skill) in submissions.iter().zip(elo_changes).zip(skill_changes) {
        let rating = RatingState::new(elo.new_elo, skill.rating, skill.ordinal);
        let delta = RatingDelta {
            elo_delta: elo.elo_delta,
            ordinal_delta: skill.ordinal_delta,
        };

        batch.submissions.push(SubmissionSnapshot {
            submission_id: submission.id,
            snapshot: ScoreSnapshot::new(rating, delta),
        });
        batch.players.push(PlayerSnapshot {
            player_id: submission.player_id.clone(),
            rating,
            delta,
        });
    }

    Ok(batch)
}

fn failure_kind(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<RankedError>() {
        Some(RankedError::StorageWriteFailure { .. }) => "storage",
        Some(RankedError::ExternalModelFailure { .. }) => "model",
        _ => "internal",
    }
}

fn submission_outcome(result: &crate::error::Result<Submission>) -> &'static str {
    match result {
        Ok(_) => "accepted",
        Err(e) => match e.downcast_ref::<RankedError>() {
            Some(RankedError::DuplicateSubmission { .. }) => "duplicate",
            Some(RankedError::PuzzleAlreadyRated { .. }) => "late",
            Some(RankedError::InvalidScoreText { .. }) => "invalid",
            _ => "error",
        },
    }
}

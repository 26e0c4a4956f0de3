//! Skill model interface and a test double
//!
//! The Bayesian skill mathematics live behind the `SkillModel` trait so the
//! engine never calls a rating library directly. The production model is
//! `WengLinSkillModel`; `MockSkillModel` records calls and can be told to fail.

use crate::error::RankedError;
use crate::types::{PlayerId, SkillRating};
use std::sync::{Mutex, RwLock};

/// A player and the rating they bring into a game
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPrior {
    pub player_id: PlayerId,
    pub rating: SkillRating,
}

/// Players that share one placement
#[derive(Debug, Clone, PartialEq)]
pub struct SkillTeam {
    pub members: Vec<PlayerPrior>,
}

impl SkillTeam {
    /// A team consisting of a single player
    pub fn solo(player_id: impl Into<PlayerId>, rating: SkillRating) -> Self {
        Self {
            members: vec![PlayerPrior {
                player_id: player_id.into(),
                rating,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Bayesian multiplayer partial-ranking update
pub trait SkillModel: Send + Sync {
    /// Compute posterior ratings
    ///
    /// # Arguments
    /// * `teams` - Teams with their prior ratings
    /// * `scores` - One score per team, higher is better, ties allowed
    ///
    /// # Returns
    /// One posterior per team member, in the same shape as `teams`
    fn rate(
        &self,
        teams: &[SkillTeam],
        scores: &[u32],
    ) -> crate::error::Result<Vec<Vec<SkillRating>>>;

    /// Prior given to players without any history
    fn default_rating(&self) -> SkillRating;

    /// Single conservative skill number used for ranking
    fn ordinal(&self, rating: &SkillRating) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

type RateCall = (Vec<SkillTeam>, Vec<u32>);

/// Mock skill model for testing
///
/// Without a fixed result it adds each team's score to every member's mean
/// and leaves the uncertainty alone.
#[derive(Debug)]
pub struct MockSkillModel {
    calls: Mutex<Vec<RateCall>>,
    fixed_result: RwLock<Option<Vec<Vec<SkillRating>>>>,
    failure: RwLock<Option<String>>,
    initial_rating: SkillRating,
}

impl Default for MockSkillModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSkillModel {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fixed_result: RwLock::new(None),
            failure: RwLock::new(None),
            initial_rating: SkillRating {
                mu: 25.0,
                sigma: 25.0 / 3.0,
            },
        }
    }

    /// Set a fixed result to return for all calls
    pub fn set_fixed_result(&self, result: Vec<Vec<SkillRating>>) {
        if let Ok(mut fixed) = self.fixed_result.write() {
            *fixed = Some(result);
        }
    }

    /// Make every following call fail
    pub fn fail_with(&self, reason: impl Into<String>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(reason.into());
        }
    }

    /// Get all calls made (for testing)
    pub fn get_calls(&self) -> Vec<RateCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl SkillModel for MockSkillModel {
    fn rate(
        &self,
        teams: &[SkillTeam],
        scores: &[u32],
    ) -> crate::error::Result<Vec<Vec<SkillRating>>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((teams.to_vec(), scores.to_vec()));
        }

        if let Ok(failure) = self.failure.read() {
            if let Some(reason) = failure.as_ref() {
                return Err(RankedError::ExternalModelFailure {
                    reason: reason.clone(),
                }
                .into());
            }
        }

        if let Ok(fixed) = self.fixed_result.read() {
            if let Some(result) = fixed.as_ref() {
                return Ok(result.clone());
            }
        }

        Ok(teams
            .iter()
            .zip(scores)
            .map(|(team, score)| {
                team.members
                    .iter()
                    .map(|member| SkillRating {
                        mu: member.rating.mu + f64::from(*score),
                        sigma: member.rating.sigma,
                    })
                    .collect()
            })
            .collect())
    }

    fn default_rating(&self) -> SkillRating {
        self.initial_rating
    }

    fn ordinal(&self, rating: &SkillRating) -> f64 {
        rating.mu - 3.0 * rating.sigma
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "mock",
            "initial_rating": self.initial_rating.mu,
            "initial_uncertainty": self.initial_rating.sigma
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior(mu: f64) -> SkillRating {
        SkillRating { mu, sigma: 8.0 }
    }

    #[test]
    fn test_solo_team() {
        let team = SkillTeam::solo("alice", prior(25.0));
        assert_eq!(team.len(), 1);
        assert!(!team.is_empty());
        assert_eq!(team.members[0].player_id, "alice");
    }

    #[test]
    fn test_mock_model_default_behavior() {
        let model = MockSkillModel::new();
        let teams = vec![
            SkillTeam::solo("alice", prior(25.0)),
            SkillTeam::solo("bob", prior(20.0)),
        ];

        let result = model.rate(&teams, &[5, 2]).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0][0].mu, 30.0);
        assert_eq!(result[1][0].mu, 22.0);
        assert_eq!(result[1][0].sigma, 8.0);

        // Should record the call
        let calls = model.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec![5, 2]);
    }

    #[test]
    fn test_mock_model_failure() {
        let model = MockSkillModel::new();
        model.fail_with("library exploded");

        let err = model
            .rate(&[SkillTeam::solo("alice", prior(25.0))], &[3])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RankedError>(),
            Some(RankedError::ExternalModelFailure { .. })
        ));
    }

    #[test]
    fn test_mock_model_fixed_result() {
        let model = MockSkillModel::new();
        model.set_fixed_result(vec![vec![prior(99.0)]]);

        let result = model
            .rate(
                &[
                    SkillTeam::solo("alice", prior(25.0)),
                    SkillTeam::solo("bob", prior(25.0)),
                ],
                &[1, 1],
            )
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0][0].mu, 99.0);
    }

    #[test]
    fn test_mock_model_ordinal() {
        let model = MockSkillModel::new();
        assert!(model.ordinal(&model.default_rating()).abs() < 1e-9);
    }
}

//! Weng-Lin (OpenSkill) skill model
//!
//! This module provides the production `SkillModel` using the Weng-Lin
//! algorithm from the skillratings crate. Scores are turned into dense
//! placements (1 = best, ties share a placement) before being handed to
//! `weng_lin_multi_team`.

use crate::error::RankedError;
use crate::ranking::dense_ranks;
use crate::rating::calculator::{SkillModel, SkillTeam};
use crate::types::SkillRating;
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::{weng_lin_multi_team, WengLinConfig, WengLinRating};
use skillratings::MultiTeamOutcome;
use tracing::debug;

/// Extended configuration for the Weng-Lin rating system
/// This wraps the skillratings WengLinConfig with additional parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedWengLinConfig {
    /// Core Weng-Lin parameters
    pub weng_lin_config: WengLinConfig,
    /// Initial mean for new players
    pub initial_rating: f64,
    /// Initial uncertainty for new players
    pub initial_uncertainty: f64,
    /// Standard deviations subtracted from the mean to get the ordinal
    pub ordinal_z: f64,
}

impl Default for ExtendedWengLinConfig {
    fn default() -> Self {
        Self {
            weng_lin_config: WengLinConfig {
                beta: 25.0 / 6.0,
                uncertainty_tolerance: 0.000_001,
            },
            initial_rating: 25.0,
            initial_uncertainty: 25.0 / 3.0,
            ordinal_z: 3.0,
        }
    }
}

impl ExtendedWengLinConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.weng_lin_config.beta <= 0.0 {
            return Err(RankedError::ConfigurationError {
                message: "Beta must be positive".to_string(),
            }
            .into());
        }

        if self.weng_lin_config.uncertainty_tolerance < 0.0 {
            return Err(RankedError::ConfigurationError {
                message: "Uncertainty tolerance must be non-negative".to_string(),
            }
            .into());
        }

        if self.initial_uncertainty <= 0.0 {
            return Err(RankedError::ConfigurationError {
                message: "Initial uncertainty must be positive".to_string(),
            }
            .into());
        }

        if self.ordinal_z < 0.0 {
            return Err(RankedError::ConfigurationError {
                message: "Ordinal z must be non-negative".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Weng-Lin skill model implementation
#[derive(Debug)]
pub struct WengLinSkillModel {
    config: ExtendedWengLinConfig,
}

impl WengLinSkillModel {
    /// Create a new Weng-Lin skill model
    pub fn new(config: ExtendedWengLinConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }
}

impl SkillModel for WengLinSkillModel {
    fn rate(
        &self,
        teams: &[SkillTeam],
        scores: &[u32],
    ) -> crate::error::Result<Vec<Vec<SkillRating>>> {
        if teams.len() != scores.len() {
            return Err(RankedError::ExternalModelFailure {
                reason: format!("{} teams but {} scores", teams.len(), scores.len()),
            }
            .into());
        }

        if teams.iter().any(SkillTeam::is_empty) {
            return Err(RankedError::ExternalModelFailure {
                reason: "Empty team passed to skill model".to_string(),
            }
            .into());
        }

        let placements = dense_ranks(scores);

        let teams_with_outcomes: Vec<(Vec<WengLinRating>, MultiTeamOutcome)> = teams
            .iter()
            .zip(&placements)
            .map(|(team, placement)| {
                let ratings = team
                    .members
                    .iter()
                    .map(|member| member.rating.into())
                    .collect();
                (ratings, MultiTeamOutcome::new(*placement as usize))
            })
            .collect();

        // Convert to the format expected by weng_lin_multi_team
        let teams_refs: Vec<(&[WengLinRating], MultiTeamOutcome)> = teams_with_outcomes
            .iter()
            .map(|(team, outcome)| (team.as_slice(), *outcome))
            .collect();

        debug!(
            "Rating {} teams with placements {:?}",
            teams_refs.len(),
            placements
        );

        let new_ratings = weng_lin_multi_team(&teams_refs, &self.config.weng_lin_config);

        Ok(new_ratings
            .into_iter()
            .map(|team| team.into_iter().map(SkillRating::from).collect())
            .collect())
    }

    fn default_rating(&self) -> SkillRating {
        SkillRating {
            mu: self.config.initial_rating,
            sigma: self.config.initial_uncertainty,
        }
    }

    fn ordinal(&self, rating: &SkillRating) -> f64 {
        rating.mu - self.config.ordinal_z * rating.sigma
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> WengLinSkillModel {
        WengLinSkillModel::new(ExtendedWengLinConfig::default()).unwrap()
    }

    #[test]
    fn test_extended_weng_lin_config_default() {
        let config = ExtendedWengLinConfig::default();
        assert_eq!(config.initial_rating, 25.0);
        assert!((config.initial_uncertainty - 25.0 / 3.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extended_weng_lin_config_validation() {
        let mut config = ExtendedWengLinConfig::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Invalid beta
        config.weng_lin_config.beta = -1.0;
        assert!(config.validate().is_err());

        // Invalid uncertainty tolerance
        config = ExtendedWengLinConfig::default();
        config.weng_lin_config.uncertainty_tolerance = -1.0;
        assert!(config.validate().is_err());

        // Invalid initial uncertainty
        config = ExtendedWengLinConfig::default();
        config.initial_uncertainty = 0.0;
        assert!(config.validate().is_err());

        config = ExtendedWengLinConfig::default();
        config.ordinal_z = -3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_prior_has_zero_ordinal() {
        let model = model();
        let prior = model.default_rating();
        assert!(model.ordinal(&prior).abs() < 1e-9);
    }

    #[test]
    fn test_winner_gains_loser_drops() {
        let model = model();
        let prior = model.default_rating();
        let teams = vec![
            SkillTeam::solo("alice", prior),
            SkillTeam::solo("bob", prior),
        ];

        let result = model.rate(&teams, &[5, 2]).unwrap();

        assert_eq!(result.len(), 2);
        assert!(result[0][0].mu > prior.mu);
        assert!(result[1][0].mu < prior.mu);
        // Both players become more certain
        assert!(result[0][0].sigma < prior.sigma);
        assert!(result[1][0].sigma < prior.sigma);
    }

    #[test]
    fn test_tied_equal_players_keep_their_mean() {
        let model = model();
        let prior = model.default_rating();
        let teams = vec![
            SkillTeam::solo("alice", prior),
            SkillTeam::solo("bob", prior),
        ];

        let result = model.rate(&teams, &[4, 4]).unwrap();

        assert!((result[0][0].mu - prior.mu).abs() < 1e-9);
        assert!((result[1][0].mu - prior.mu).abs() < 1e-9);
    }

    #[test]
    fn test_four_player_ordering() {
        let model = model();
        let prior = model.default_rating();
        let teams: Vec<SkillTeam> = ["p1", "p2", "p3", "p4"]
            .iter()
            .map(|id| SkillTeam::solo(*id, prior))
            .collect();

        let result = model.rate(&teams, &[6, 3, 1, 0]).unwrap();

        assert_eq!(result.len(), 4);
        assert!(result[0][0].mu > result[1][0].mu);
        assert!(result[1][0].mu > result[2][0].mu);
        assert!(result[2][0].mu > result[3][0].mu);
    }

    #[test]
    fn test_invalid_inputs() {
        let model = model();
        let prior = model.default_rating();

        // Mismatched scores
        let result = model.rate(&[SkillTeam::solo("alice", prior)], &[1, 2]);
        assert!(result.is_err());

        // Empty team
        let result = model.rate(&[SkillTeam { members: vec![] }], &[1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_json() {
        let model = model();
        let config = model.config();
        assert_eq!(config["initial_rating"], 25.0);
        assert_eq!(config["ordinal_z"], 3.0);
    }
}

//! Skill update adapter
//!
//! Builds the `SkillModel` input for one puzzle day and maps its output back
//! onto players. Every player is entered as a team of one and ranked by
//! calculated score. The rating mathematics belong to the model; this module
//! only shapes input, checks output and derives ordinals.

use crate::error::RankedError;
use crate::rating::calculator::{SkillModel, SkillTeam};
use crate::types::{PlayerId, SkillRating};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A player's skill going into the day
#[derive(Debug, Clone, PartialEq)]
pub struct SkillParticipant {
    pub player_id: PlayerId,
    pub score: u32,
    pub prior: SkillRating,
    pub prior_ordinal: f64,
}

/// Skill result for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillChange {
    pub player_id: PlayerId,
    pub rating: SkillRating,
    pub ordinal: f64,
    pub ordinal_delta: f64,
}

impl SkillChange {
    fn unchanged(participant: &SkillParticipant) -> Self {
        Self {
            player_id: participant.player_id.clone(),
            rating: participant.prior,
            ordinal: participant.prior_ordinal,
            ordinal_delta: 0.0,
        }
    }
}

/// Maps a day's participants through a `SkillModel`
pub struct SkillUpdateAdapter<'a> {
    model: &'a dyn SkillModel,
}

impl<'a> SkillUpdateAdapter<'a> {
    pub fn new(model: &'a dyn SkillModel) -> Self {
        Self { model }
    }

    /// Wrap every participant in its own team
    pub fn singleton_teams(participants: &[SkillParticipant]) -> Vec<SkillTeam> {
        participants
            .iter()
            .map(|p| SkillTeam::solo(p.player_id.clone(), p.prior))
            .collect()
    }

    /// Compute the day's skill changes, in input order
    ///
    /// Fewer than two participants leaves every rating as it was.
    pub fn apply(&self, participants: &[SkillParticipant]) -> crate::error::Result<Vec<SkillChange>> {
        if participants.len() < 2 {
            return Ok(participants.iter().map(SkillChange::unchanged).collect());
        }

        let teams = Self::singleton_teams(participants);
        let scores: Vec<u32> = participants.iter().map(|p| p.score).collect();

        debug!("Calling skill model with {} singleton teams", teams.len());

        let posteriors = self.model.rate(&teams, &scores).map_err(|e| {
            if e.downcast_ref::<RankedError>().is_some() {
                e
            } else {
                RankedError::ExternalModelFailure {
                    reason: e.to_string(),
                }
                .into()
            }
        })?;

        check_shape(&teams, &posteriors)?;

        Ok(participants
            .iter()
            .zip(posteriors)
            .map(|(participant, team)| {
                let rating = team[0];
                let ordinal = self.model.ordinal(&rating);
                SkillChange {
                    player_id: participant.player_id.clone(),
                    rating,
                    ordinal,
                    ordinal_delta: ordinal - participant.prior_ordinal,
                }
            })
            .collect())
    }
}

fn check_shape(teams: &[SkillTeam], posteriors: &[Vec<SkillRating>]) -> crate::error::Result<()> {
    if posteriors.len() != teams.len() {
        warn!(
            "Skill model returned {} teams for {} inputs",
            posteriors.len(),
            teams.len()
        );
        return Err(RankedError::ExternalModelFailure {
            reason: format!(
                "expected {} teams in model output, got {}",
                teams.len(),
                posteriors.len()
            ),
        }
        .into());
    }

    for (team, posterior) in teams.iter().zip(posteriors) {
        if posterior.len() != team.len() {
            return Err(RankedError::ExternalModelFailure {
                reason: format!(
                    "expected {} ratings for team of {}, got {}",
                    team.len(),
                    team.members[0].player_id,
                    posterior.len()
                ),
            }
            .into());
        }

        if posterior
            .iter()
            .any(|r| !r.mu.is_finite() || !r.sigma.is_finite() || r.sigma <= 0.0)
        {
            return Err(RankedError::ExternalModelFailure {
                reason: format!(
                    "non-finite rating returned for {}",
                    team.members[0].player_id
                ),
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::calculator::MockSkillModel;
    use crate::rating::weng_lin::{ExtendedWengLinConfig, WengLinSkillModel};

    fn participant(id: &str, score: u32, mu: f64) -> SkillParticipant {
        let prior = SkillRating { mu, sigma: 8.0 };
        SkillParticipant {
            player_id: id.to_string(),
            score,
            prior,
            prior_ordinal: mu - 24.0,
        }
    }

    #[test]
    fn test_singleton_teams() {
        let participants = vec![participant("a", 5, 25.0), participant("b", 3, 25.0)];
        let teams = SkillUpdateAdapter::singleton_teams(&participants);
        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|t| t.len() == 1));
        assert_eq!(teams[1].members[0].player_id, "b");
    }

    #[test]
    fn test_scores_passed_in_order() {
        let model = MockSkillModel::new();
        let adapter = SkillUpdateAdapter::new(&model);

        let participants = vec![
            participant("a", 5, 25.0),
            participant("b", 3, 25.0),
            participant("c", 0, 25.0),
        ];
        let changes = adapter.apply(&participants).unwrap();

        let calls = model.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec![5, 3, 0]);

        // Mock adds the score to mu
        assert_eq!(changes[0].rating.mu, 30.0);
        assert_eq!(changes[0].ordinal, 30.0 - 24.0);
        assert_eq!(changes[0].ordinal_delta, 5.0);
        assert_eq!(changes[2].ordinal_delta, 0.0);
    }

    #[test]
    fn test_single_participant_skips_model() {
        let model = MockSkillModel::new();
        let adapter = SkillUpdateAdapter::new(&model);

        let changes = adapter.apply(&[participant("solo", 6, 31.0)]).unwrap();

        assert!(model.get_calls().is_empty());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].ordinal_delta, 0.0);
        assert_eq!(changes[0].rating.mu, 31.0);
    }

    #[test]
    fn test_empty_day() {
        let model = MockSkillModel::new();
        let adapter = SkillUpdateAdapter::new(&model);
        assert!(adapter.apply(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_model_failure_is_surfaced() {
        let model = MockSkillModel::new();
        model.fail_with("boom");
        let adapter = SkillUpdateAdapter::new(&model);

        let err = adapter
            .apply(&[participant("a", 5, 25.0), participant("b", 3, 25.0)])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RankedError>(),
            Some(RankedError::ExternalModelFailure { .. })
        ));
    }

    #[test]
    fn test_malformed_output_rejected() {
        let model = MockSkillModel::new();
        let adapter = SkillUpdateAdapter::new(&model);
        let participants = vec![participant("a", 5, 25.0), participant("b", 3, 25.0)];

        // Too few teams
        model.set_fixed_result(vec![vec![SkillRating { mu: 26.0, sigma: 7.0 }]]);
        assert!(adapter.apply(&participants).is_err());

        // Wrong team size
        model.set_fixed_result(vec![vec![], vec![SkillRating { mu: 26.0, sigma: 7.0 }]]);
        assert!(adapter.apply(&participants).is_err());

        // Non-finite values
        model.set_fixed_result(vec![
            vec![SkillRating { mu: f64::NAN, sigma: 7.0 }],
            vec![SkillRating { mu: 26.0, sigma: 7.0 }],
        ]);
        let err = adapter.apply(&participants).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RankedError>(),
            Some(RankedError::ExternalModelFailure { .. })
        ));
    }

    #[test]
    fn test_weng_lin_ordinal_delta_sign() {
        let model = WengLinSkillModel::new(ExtendedWengLinConfig::default()).unwrap();
        let adapter = SkillUpdateAdapter::new(&model);
        let prior = model.default_rating();
        let prior_ordinal = model.ordinal(&prior);

        let participants = vec![
            SkillParticipant {
                player_id: "winner".to_string(),
                score: 6,
                prior,
                prior_ordinal,
            },
            SkillParticipant {
                player_id: "loser".to_string(),
                score: 1,
                prior,
                prior_ordinal,
            },
        ];

        let changes = adapter.apply(&participants).unwrap();
        assert!(changes[0].ordinal_delta > 0.0);
        assert!(changes[0].ordinal_delta > changes[1].ordinal_delta);
        assert!((changes[0].ordinal - (prior_ordinal + changes[0].ordinal_delta)).abs() < 1e-12);
    }
}

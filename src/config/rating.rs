//! Elo rating configuration

use crate::error::RankedError;
use serde::{Deserialize, Serialize};

/// Parameters of the pairwise Elo system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Maximum change per pairwise comparison
    pub k_factor: f64,
    /// Rating difference at which the stronger player is 10x as likely to win
    pub elo_scale: f64,
    /// Elo given to newly seen players
    pub initial_elo: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            elo_scale: 400.0,
            initial_elo: 400.0,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.k_factor.is_finite() && self.k_factor > 0.0) {
            return Err(RankedError::ConfigurationError {
                message: "K factor must be positive".to_string(),
            }
            .into());
        }

        if !(self.elo_scale.is_finite() && self.elo_scale > 0.0) {
            return Err(RankedError::ConfigurationError {
                message: "Elo scale must be positive".to_string(),
            }
            .into());
        }

        if !self.initial_elo.is_finite() {
            return Err(RankedError::ConfigurationError {
                message: "Initial Elo must be finite".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let mut config = RatingConfig::default();
        assert!(config.validate().is_ok());

        config.k_factor = 0.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.elo_scale = -400.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.initial_elo = f64::NAN;
        assert!(config.validate().is_err());
    }
}

//! Main application configuration
//!
//! This module defines the primary configuration structures for the ranked
//! wordle service, including environment variable and file loading and
//! validation. An `AppConfig` is built once at start-up and handed to the
//! engine; nothing reads configuration from globals.

use crate::config::rating::RatingConfig;
use crate::rating::weng_lin::ExtendedWengLinConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub skill: ExtendedWengLinConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// JSON file holding players, submissions and rated puzzles
    pub data_file: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "ranked-wordle".to_string(),
            log_level: "info".to_string(),
            data_file: PathBuf::from("ranked-wordle.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(data_file) = env::var("DATA_FILE") {
            self.service.data_file = PathBuf::from(data_file);
        }

        // Elo settings
        if let Ok(k) = env::var("ELO_K_FACTOR") {
            self.rating.k_factor = k
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_K_FACTOR value: {}", k))?;
        }
        if let Ok(scale) = env::var("ELO_SCALE") {
            self.rating.elo_scale = scale
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_SCALE value: {}", scale))?;
        }
        if let Ok(initial) = env::var("ELO_INITIAL_RATING") {
            self.rating.initial_elo = initial
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_INITIAL_RATING value: {}", initial))?;
        }

        // Skill model settings
        if let Ok(beta) = env::var("SKILL_BETA") {
            self.skill.weng_lin_config.beta = beta
                .parse()
                .map_err(|_| anyhow!("Invalid SKILL_BETA value: {}", beta))?;
        }
        if let Ok(mu) = env::var("SKILL_INITIAL_MU") {
            self.skill.initial_rating = mu
                .parse()
                .map_err(|_| anyhow!("Invalid SKILL_INITIAL_MU value: {}", mu))?;
        }
        if let Ok(sigma) = env::var("SKILL_INITIAL_SIGMA") {
            self.skill.initial_uncertainty = sigma
                .parse()
                .map_err(|_| anyhow!("Invalid SKILL_INITIAL_SIGMA value: {}", sigma))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.data_file.as_os_str().is_empty() {
        return Err(anyhow!("Data file path cannot be empty"));
    }

    config.rating.validate()?;
    config.skill.validate()?;

    Ok(())
}

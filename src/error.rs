//! Error types for the rating engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Conditions that are "nothing to do" (an empty
//! day, a single participant, a first-time player) are not errors and never
//! show up here.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum RankedError {
    #[error("Duplicate submission from {player_id} for puzzle {puzzle}")]
    DuplicateSubmission { player_id: String, puzzle: u32 },

    #[error("Puzzle {puzzle} has already been rated")]
    DuplicateComputation { puzzle: u32 },

    #[error("Puzzle {puzzle} is already rated, late submission from {player_id} rejected")]
    PuzzleAlreadyRated { player_id: String, puzzle: u32 },

    #[error("Storage write failed: {message}")]
    StorageWriteFailure { message: String },

    #[error("Skill model failed: {reason}")]
    ExternalModelFailure { reason: String },

    #[error("Invalid score text: {text:?}")]
    InvalidScoreText { text: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Player already registered: {player_id}")]
    PlayerAlreadyRegistered { player_id: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

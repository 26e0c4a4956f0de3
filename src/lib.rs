//! Ranked Wordle - competitive ratings for daily Wordle results
//!
//! Players share their daily result, each puzzle day is rated with a
//! pairwise Elo round and a Weng-Lin (OpenSkill) skill update, and every
//! change can be explained comparison by comparison.

pub mod audit;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ranking;
pub mod rating;
pub mod report;
pub mod score;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankedError, Result};
pub use types::*;

// Re-export key components
pub use rating::{RatingStore, SkillModel};
pub use service::RatingEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

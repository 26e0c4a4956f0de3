//! Rating systems and their storage
//!
//! Pairwise Elo, the Weng-Lin (OpenSkill) skill model behind the
//! `SkillModel` trait, the adapter that feeds a puzzle day into it, and the
//! store that commits each day atomically.

pub mod adapter;
pub mod calculator;
pub mod elo;
pub mod storage;
pub mod weng_lin;

// Re-export commonly used types
pub use adapter::{SkillChange, SkillParticipant, SkillUpdateAdapter};
pub use calculator::{SkillModel, SkillTeam};
pub use elo::{EloChange, EloParticipant, Outcome, PairwiseRound};
pub use storage::{InMemoryRatingStore, RatingStore};
pub use weng_lin::{ExtendedWengLinConfig, WengLinSkillModel};

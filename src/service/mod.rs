//! Service layer for the ranked wordle engine
//!
//! `RatingEngine` is built once from `AppConfig` and shared behind an `Arc`
//! by whatever drives it.

pub mod engine;

pub use engine::{initial_rating, RatingEngine, WEEK_SPAN};

//! Core primitives.
//!
//! Identifiers and the match random number generator. Nothing in here knows
//! about cards or turns.

pub mod ids;
pub mod rng;

// Re-export core types
pub use ids::{CardId, MatchId, UserId};
pub use rng::DeterministicRng;

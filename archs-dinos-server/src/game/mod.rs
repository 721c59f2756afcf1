//! Game Logic Module
//!
//! Card catalog, match state and the rules that mutate it. Every operation
//! here is a plain function over `&mut MatchState`; the caller holds the
//! match lock.
//!
//! ## Module Structure
//!
//! - `card`: Static catalog of the 96 cards
//! - `board`: Central board with the three Arch armies
//! - `player`: Per-player hand, dinos and score
//! - `state`: Match state and the locked session wrapper
//! - `rules`: Configuration and per-turn legality checks
//! - `setup`: Seating, shuffling and dealing
//! - `actions`: Draw, play, attach, end turn, expel
//! - `battle`: Provoking an army
//! - `end`: End conditions and final standings
//! - `events`: Domain events for broadcasting

pub mod actions;
pub mod battle;
pub mod board;
pub mod card;
pub mod end;
pub mod error;
pub mod events;
pub mod player;
pub mod rules;
pub mod setup;
pub mod state;

// Re-export key types
pub use battle::BattleResult;
pub use card::{CardInstance, Element, Role};
pub use end::{EndReason, GameSummary};
pub use error::{GameError, GameResult};
pub use events::GameEvent;
pub use player::{DinoInstance, PlayerSession};
pub use rules::GameRules;
pub use state::{GameSession, MatchPhase, MatchState};

//! # Archs vs Dinos Game Server
//!
//! Authoritative match engine for the Archs vs Dinos card game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ARCHS VS DINOS SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── ids.rs      - Match, user and card identifiers          │
//! │  └── rng.rs      - Xorshift128+ PRNG with seed derivation    │
//! │                                                              │
//! │  game/           - Game logic (runs under the match lock)    │
//! │  ├── card.rs     - Card catalog                              │
//! │  ├── state.rs    - Match state and session                   │
//! │  ├── rules.rs    - Turn budget checks                        │
//! │  ├── setup.rs    - Shuffle and deal                          │
//! │  ├── actions.rs  - Draw, play, attach, end turn              │
//! │  ├── battle.rs   - Provoke resolution                        │
//! │  └── end.rs      - End conditions                            │
//! │                                                              │
//! │  network/        - Request surface                           │
//! │  ├── service.rs  - Request handlers                          │
//! │  ├── session.rs  - Session registry                          │
//! │  ├── broadcast.rs- Per-player event channels                 │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! Each match is guarded by its own mutex; unrelated matches never contend.
//! Events produced under the lock are delivered after it is released.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::ids::{CardId, MatchId, UserId};
pub use crate::core::rng::DeterministicRng;
pub use crate::game::error::{GameError, GameResult};
pub use crate::game::rules::GameRules;
pub use crate::network::service::GameService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

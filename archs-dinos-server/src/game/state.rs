//! Match State
//!
//! Authoritative state of one match and the session wrapper that guards it.
//! Every read-modify-write of counters, piles or the board happens while
//! holding [`GameSession::lock`]. Lock order is session, then player.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::{CardId, MatchId, UserId};
use crate::core::rng::DeterministicRng;
use crate::game::board::{BoardSnapshot, CentralBoard};
use crate::game::card::CardInstance;
use crate::game::events::GameEvent;
use crate::game::player::{PlayerSession, PlayerSummary};
use crate::game::rules::GameRules;

// =============================================================================
// PHASE AND COUNTERS
// =============================================================================

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Registered, nobody seated.
    Created,
    /// Players seated and hands dealt.
    Dealt,
    /// Turns are running.
    Playing,
    /// Match is over.
    Ended,
}

/// What the turn owner has done this turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCounters {
    /// Cards drawn
    pub draws: u32,
    /// Cards played (heads and body parts)
    pub plays: u32,
    /// Whether the main action (provoke) was taken
    pub main_action_taken: bool,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Everything a match owns. Only reachable through a [`GameSession`] lock.
#[derive(Debug)]
pub struct MatchState {
    /// Match identifier
    pub match_id: MatchId,
    /// Rules in force
    pub rules: GameRules,
    /// Lifecycle phase
    pub phase: MatchPhase,
    /// Seated players; order is turn order
    pub players: Vec<Arc<PlayerSession>>,
    /// Player whose turn it is
    pub turn_owner: Option<UserId>,
    /// Turns started so far
    pub turn_number: u32,
    /// Per-turn counters
    pub counters: TurnCounters,
    /// Draw deck; top card is the last element
    pub deck: Vec<CardId>,
    /// Discard pile
    pub discard: Vec<CardInstance>,
    /// Arch armies
    pub board: CentralBoard,
    /// When the session was registered
    pub created_at: DateTime<Utc>,
    /// When the first turn began
    pub started_at: Option<DateTime<Utc>>,
    /// Shuffle and first-player randomness
    pub rng: DeterministicRng,
    next_dino_id: u32,
    pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create an empty match.
    pub fn new(match_id: MatchId, rules: GameRules, rng: DeterministicRng) -> Self {
        Self {
            match_id,
            rules,
            phase: MatchPhase::Created,
            players: Vec::new(),
            turn_owner: None,
            turn_number: 0,
            counters: TurnCounters::default(),
            deck: Vec::new(),
            discard: Vec::new(),
            board: CentralBoard::new(),
            created_at: Utc::now(),
            started_at: None,
            rng,
            next_dino_id: 1,
            pending_events: Vec::new(),
        }
    }

    /// Clear players, piles and turn data so the match can be dealt again.
    pub fn reset(&mut self) {
        for player in &self.players {
            *player.holdings() = Default::default();
        }
        self.players.clear();
        self.phase = MatchPhase::Created;
        self.turn_owner = None;
        self.turn_number = 0;
        self.counters = TurnCounters::default();
        self.deck.clear();
        self.discard.clear();
        self.board.clear();
        self.started_at = None;
        self.next_dino_id = 1;
        self.pending_events.clear();
    }

    /// Whether turns are running.
    pub fn is_started(&self) -> bool {
        self.phase == MatchPhase::Playing
    }

    /// Whether the match is over.
    pub fn is_ended(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    /// Seated player by id.
    pub fn player(&self, user: UserId) -> Option<&Arc<PlayerSession>> {
        self.players.iter().find(|p| p.user_id() == user)
    }

    /// Position of a player in turn order.
    pub fn seat_of(&self, user: UserId) -> Option<usize> {
        self.players.iter().position(|p| p.user_id() == user)
    }

    /// Seated player ids in turn order.
    pub fn player_ids(&self) -> Vec<UserId> {
        self.players.iter().map(|p| p.user_id()).collect()
    }

    /// Player after `user` in turn order, wrapping around.
    pub fn next_after(&self, user: UserId) -> Option<UserId> {
        let seat = self.seat_of(user)?;
        let next = (seat + 1) % self.players.len();
        Some(self.players[next].user_id())
    }

    /// Allocate a dino instance id.
    pub fn next_dino_id(&mut self) -> u32 {
        let id = self.next_dino_id;
        self.next_dino_id += 1;
        id
    }

    /// Time since the first turn (zero before start).
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.started_at
            .map(|start| now - start)
            .unwrap_or_else(chrono::Duration::zero)
    }

    /// Queue an event for broadcast once the lock is released.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take queued events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Read-only view for `GetGameState`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> GameStateSnapshot {
        let elapsed = self.elapsed(now);
        let remaining = (self.rules.match_duration() - elapsed).max(chrono::Duration::zero());
        GameStateSnapshot {
            match_id: self.match_id.clone(),
            phase: self.phase,
            turn_owner: self.turn_owner,
            turn_number: self.turn_number,
            counters: self.counters,
            deck_remaining: self.deck.len(),
            discard_count: self.discard.len(),
            board: self.board.snapshot(),
            players: self.players.iter().map(|p| p.summary()).collect(),
            started_at: self.started_at,
            elapsed_secs: elapsed.num_seconds(),
            remaining_secs: remaining.num_seconds(),
        }
    }
}

/// Public view of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    /// Match identifier
    pub match_id: MatchId,
    /// Lifecycle phase
    pub phase: MatchPhase,
    /// Current turn owner
    pub turn_owner: Option<UserId>,
    /// Turn counter
    pub turn_number: u32,
    /// Per-turn counters
    pub counters: TurnCounters,
    /// Cards left in the draw deck
    pub deck_remaining: usize,
    /// Cards in the discard pile
    pub discard_count: usize,
    /// Arch armies
    pub board: BoardSnapshot,
    /// Public player data in turn order
    pub players: Vec<PlayerSummary>,
    /// Start time
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds since start
    pub elapsed_secs: i64,
    /// Seconds until the time limit
    pub remaining_secs: i64,
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// One active match behind its own exclusive lock.
#[derive(Debug)]
pub struct GameSession {
    match_id: MatchId,
    state: Mutex<MatchState>,
}

impl GameSession {
    /// Wrap a fresh match state.
    pub fn new(match_id: MatchId, rules: GameRules, rng: DeterministicRng) -> Self {
        Self {
            state: Mutex::new(MatchState::new(match_id.clone(), rules, rng)),
            match_id,
        }
    }

    /// Match identifier.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Acquire the match lock.
    ///
    /// A poisoned lock is recovered; the state is still consistent because
    /// every action validates before it mutates.
    pub fn lock(&self) -> MutexGuard<'_, MatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Two seated players, game running, first player to move.
    pub fn started_state() -> (MatchState, UserId, UserId) {
        let a = UserId::new(1);
        let b = UserId::new(2);
        let mut state = MatchState::new(
            MatchId::parse("test-match").unwrap(),
            GameRules::default(),
            DeterministicRng::new(42),
        );
        state.players.push(Arc::new(PlayerSession::new(a, 0)));
        state.players.push(Arc::new(PlayerSession::new(b, 1)));
        state.phase = MatchPhase::Playing;
        state.started_at = Some(Utc::now());
        state.turn_owner = Some(a);
        state.turn_number = 1;
        (state, a, b)
    }

    /// Put catalog cards into a player's hand.
    pub fn give(state: &MatchState, user: UserId, ids: &[u16]) {
        let player = state.player(user).unwrap();
        let mut holdings = player.holdings();
        for id in ids {
            holdings
                .hand
                .push(crate::game::card::instantiate(CardId::new(*id)).unwrap());
        }
    }
}

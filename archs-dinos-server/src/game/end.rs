//! End of Match
//!
//! A match ends when the draw deck runs out or the time limit passes. The
//! time limit is advisory: it is evaluated when someone asks, there is no
//! timer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::ids::{MatchId, UserId};
use crate::game::events::GameEvent;
use crate::game::state::{MatchPhase, MatchState};

/// Why the match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Draw deck is empty.
    CardsDepleted,
    /// Match duration elapsed.
    TimeExpired,
    /// Too few players remain after expulsions.
    PlayersLeft,
}

/// Final score line of one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Player
    pub user_id: UserId,
    /// Seat number
    pub turn_order: usize,
    /// Final score
    pub score: u32,
}

/// Match outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Match identifier
    pub match_id: MatchId,
    /// Termination reason
    pub reason: EndReason,
    /// Highest scorer (earliest seat on equal scores)
    pub winner: Option<UserId>,
    /// Winner's score
    pub winner_score: u32,
    /// All players, best first
    pub standings: Vec<Standing>,
    /// Turns started during the match
    pub turns_played: u32,
    /// When the match ended
    pub ended_at: DateTime<Utc>,
}

/// Reason the match should end now, if any.
pub fn end_reason(state: &MatchState, now: DateTime<Utc>) -> Option<EndReason> {
    if !state.is_started() {
        return None;
    }
    if state.deck.is_empty() {
        Some(EndReason::CardsDepleted)
    } else if state.elapsed(now) >= state.rules.match_duration() {
        Some(EndReason::TimeExpired)
    } else if state.players.len() < state.rules.min_players {
        Some(EndReason::PlayersLeft)
    } else {
        None
    }
}

/// Whether the match should end now.
pub fn should_end(state: &MatchState, now: DateTime<Utc>) -> bool {
    end_reason(state, now).is_some()
}

/// End the match if an end condition holds.
pub fn end_game(state: &mut MatchState, now: DateTime<Utc>) -> Option<GameSummary> {
    let reason = end_reason(state, now)?;
    Some(finish(state, reason, now))
}

/// End the match for `reason` unconditionally.
pub fn finish(state: &mut MatchState, reason: EndReason, now: DateTime<Utc>) -> GameSummary {
    let mut standings: Vec<Standing> = state
        .players
        .iter()
        .map(|p| Standing {
            user_id: p.user_id(),
            turn_order: p.turn_order(),
            score: p.score(),
        })
        .collect();
    // Stable sort keeps seat order among equal scores.
    standings.sort_by(|a, b| b.score.cmp(&a.score));

    let winner = standings.first().map(|s| s.user_id);
    let winner_score = standings.first().map(|s| s.score).unwrap_or(0);

    state.phase = MatchPhase::Ended;
    state.turn_owner = None;

    let summary = GameSummary {
        match_id: state.match_id.clone(),
        reason,
        winner,
        winner_score,
        standings,
        turns_played: state.turn_number,
        ended_at: now,
    };

    info!(
        match_id = %state.match_id,
        reason = ?reason,
        winner = ?winner,
        winner_score,
        "match ended"
    );
    state.push_event(GameEvent::GameEnded {
        summary: summary.clone(),
    });

    summary
}

//! Game Events
//!
//! Domain events produced by match operations. Handlers queue them on the
//! match state; the service drains the queue after releasing the match lock
//! and fans them out to participants.

use serde::{Deserialize, Serialize};

use crate::core::ids::{CardId, UserId};
use crate::game::battle::BattleResult;
use crate::game::board::BoardSnapshot;
use crate::game::card::CardInstance;
use crate::game::end::GameSummary;
use crate::game::player::DinoInstance;

/// Something every participant (or one recipient) should learn about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// Roster seated and hands dealt.
    SessionInitialized {
        players: Vec<UserId>,
    },

    /// Match started. Built per recipient: `hand` is the recipient's own.
    GameStarted {
        first_player: UserId,
        hand: Vec<CardInstance>,
        board: BoardSnapshot,
    },

    /// A new turn began.
    TurnChanged {
        turn_owner: UserId,
        turn_number: u32,
    },

    /// A card left the deck. `to_hand` is false for Arch cards.
    CardDrawn {
        user_id: UserId,
        card: CardInstance,
        to_hand: bool,
        deck_remaining: usize,
    },

    /// A head was played as a new dino.
    DinoHeadPlayed {
        user_id: UserId,
        dino: DinoInstance,
    },

    /// A body part was attached to a dino.
    BodyPartAttached {
        user_id: UserId,
        head_id: CardId,
        part: CardInstance,
        total_power: u32,
    },

    /// An Arch card joined its army.
    ArchAddedToBoard {
        card: CardInstance,
        army_power: u32,
    },

    /// An army was provoked and the battle resolved.
    ArmyProvoked {
        provoker: UserId,
        result: BattleResult,
    },

    /// The match is over.
    GameEnded {
        summary: GameSummary,
    },

    /// A player was removed from the match.
    PlayerExpelled {
        user_id: UserId,
        reason: String,
    },
}

impl GameEvent {
    /// Player the event is about, if any.
    pub fn subject(&self) -> Option<UserId> {
        match self {
            GameEvent::TurnChanged { turn_owner, .. } => Some(*turn_owner),
            GameEvent::CardDrawn { user_id, .. }
            | GameEvent::DinoHeadPlayed { user_id, .. }
            | GameEvent::BodyPartAttached { user_id, .. }
            | GameEvent::PlayerExpelled { user_id, .. } => Some(*user_id),
            GameEvent::ArmyProvoked { provoker, .. } => Some(*provoker),
            GameEvent::GameEnded { summary } => summary.winner,
            GameEvent::GameStarted { first_player, .. } => Some(*first_player),
            GameEvent::SessionInitialized { .. } | GameEvent::ArchAddedToBoard { .. } => None,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::SessionInitialized { .. } => "session_initialized",
            GameEvent::GameStarted { .. } => "game_started",
            GameEvent::TurnChanged { .. } => "turn_changed",
            GameEvent::CardDrawn { .. } => "card_drawn",
            GameEvent::DinoHeadPlayed { .. } => "dino_head_played",
            GameEvent::BodyPartAttached { .. } => "body_part_attached",
            GameEvent::ArchAddedToBoard { .. } => "arch_added_to_board",
            GameEvent::ArmyProvoked { .. } => "army_provoked",
            GameEvent::GameEnded { .. } => "game_ended",
            GameEvent::PlayerExpelled { .. } => "player_expelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_snake_case_tag() {
        let event = GameEvent::TurnChanged {
            turn_owner: UserId::new(4),
            turn_number: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"turn_changed\""));

        let parsed: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.kind(), "turn_changed");
    }

    #[test]
    fn test_subject() {
        let event = GameEvent::PlayerExpelled {
            user_id: UserId::new(3),
            reason: "idle".to_string(),
        };
        assert_eq!(event.subject(), Some(UserId::new(3)));
        assert_eq!(GameEvent::SessionInitialized { players: vec![] }.subject(), None);
    }
}

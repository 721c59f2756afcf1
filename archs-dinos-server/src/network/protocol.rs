//! Protocol Messages
//!
//! Wire types for the request surface and for outbound notifications.
//! Requests and notifications are JSON (internally tagged). Responses also
//! have a binary (bincode) form.

use serde::{Deserialize, Serialize};

use crate::core::ids::{CardId, MatchId, UserId};
use crate::game::actions::DrawOutcome;
use crate::game::battle::BattleResult;
use crate::game::board::BoardSnapshot;
use crate::game::card::CardInstance;
use crate::game::end::GameSummary;
use crate::game::error::GameError;
use crate::game::events::GameEvent;
use crate::game::player::DinoInstance;
use crate::game::setup::SetupReport;
use crate::game::state::GameStateSnapshot;

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Requests accepted by the game service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Seat a roster and deal.
    InitializeSession {
        match_id: String,
        players: Vec<UserId>,
    },

    /// Pick the first player and start turns.
    StartGame { match_id: String },

    /// Draw from the deck (`pile_index` < 3, all map to one deck).
    DrawCard {
        match_id: String,
        user_id: UserId,
        pile_index: usize,
    },

    /// Play a head card as a new dino.
    PlayDinoHead {
        match_id: String,
        user_id: UserId,
        card_id: CardId,
    },

    /// Attach a body part to a dino.
    AttachBodyPart {
        match_id: String,
        user_id: UserId,
        body_card_id: CardId,
        head_card_id: CardId,
    },

    /// Provoke an elemental army. Element names are case-insensitive.
    ProvokeArmy {
        match_id: String,
        user_id: UserId,
        element: String,
    },

    /// End the current turn.
    EndTurn { match_id: String, user_id: UserId },

    /// Public match snapshot.
    GetGameState { match_id: String },

    /// A player's own hand.
    GetPlayerHand { match_id: String, user_id: UserId },

    /// Arch armies.
    GetCentralBoard { match_id: String },
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

/// Reply to a [`ClientRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerResponse {
    /// Request succeeded.
    Ok(ResponsePayload),
    /// Request was refused.
    Error(ServerError),
}

/// Successful reply bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Roster seated.
    SessionInitialized(SetupReport),
    /// Turns started.
    GameStarted(GameStart),
    /// Card drawn.
    CardDrawn(DrawOutcome),
    /// New dino.
    DinoPlayed(DinoInstance),
    /// Dino after attachment.
    BodyPartAttached(DinoInstance),
    /// Battle outcome.
    ArmyProvoked(BattleResult),
    /// Turn passed.
    TurnEnded(TurnEnd),
    /// Match snapshot.
    GameState(GameStateSnapshot),
    /// Caller's hand.
    PlayerHand(Vec<CardInstance>),
    /// Arch armies.
    CentralBoard(BoardSnapshot),
}

/// Result of starting a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStart {
    /// Player who moves first
    pub first_player: UserId,
    /// Players whose start notification could not be delivered
    pub unreachable: Vec<UserId>,
}

/// Result of ending a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEnd {
    /// New turn owner (absent when the match ended)
    pub next_turn_owner: Option<UserId>,
    /// Final summary when the match ended on this turn change
    pub game_over: Option<GameSummary>,
}

/// One-way notification pushed to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Domain event of a match.
    Event { match_id: MatchId, event: GameEvent },
    /// Server is shutting down.
    Shutdown { reason: String },
}

/// Refusal detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Not the caller's turn.
    NotYourTurn,
    /// Turn budget used up.
    ActionBudgetExhausted,
    /// Play limit used up.
    PlayLimitReached,
    /// Provoke not allowed now.
    ProvokeNotAllowed,
    /// Card not in hand.
    CardNotInHand,
    /// Card role does not fit the action.
    WrongRole,
    /// Elements differ.
    ElementMismatch,
    /// Part does not fit the dino.
    IncompatibleBodyPart,
    /// No such dino.
    DinoNotFound,
    /// Deck exhausted.
    EmptyDeck,
    /// Bad pile index.
    InvalidPile,
    /// Army is empty.
    EmptyArmy,
    /// Unknown card id.
    UnknownCard,
    /// Player not in match.
    PlayerNotFound,
    /// Roster size out of range.
    InvalidPlayerCount,
    /// Invalid or duplicate player.
    InvalidPlayer,
    /// Game not started.
    GameNotStarted,
    /// Game already started.
    GameAlreadyStarted,
    /// Match not found.
    MatchNotFound,
    /// Match is over.
    MatchEnded,
    /// Match id failed validation.
    InvalidMatchId,
    /// Malformed request.
    InvalidInput,
}

impl From<&GameError> for ErrorCode {
    fn from(err: &GameError) -> Self {
        match err {
            GameError::NotYourTurn => ErrorCode::NotYourTurn,
            GameError::ActionBudgetExhausted => ErrorCode::ActionBudgetExhausted,
            GameError::PlayLimitReached => ErrorCode::PlayLimitReached,
            GameError::ProvokeNotAllowed => ErrorCode::ProvokeNotAllowed,
            GameError::CardNotInHand(_) => ErrorCode::CardNotInHand,
            GameError::WrongRole(_) => ErrorCode::WrongRole,
            GameError::ElementMismatch { .. } => ErrorCode::ElementMismatch,
            GameError::IncompatibleBodyPart(_) => ErrorCode::IncompatibleBodyPart,
            GameError::DinoNotFound(_) => ErrorCode::DinoNotFound,
            GameError::EmptyDeck => ErrorCode::EmptyDeck,
            GameError::InvalidPile(_) => ErrorCode::InvalidPile,
            GameError::EmptyArmy(_) => ErrorCode::EmptyArmy,
            GameError::UnknownCard(_) => ErrorCode::UnknownCard,
            GameError::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            GameError::InvalidPlayerCount(_) => ErrorCode::InvalidPlayerCount,
            GameError::InvalidPlayer(_) => ErrorCode::InvalidPlayer,
            GameError::GameNotStarted => ErrorCode::GameNotStarted,
            GameError::GameAlreadyStarted => ErrorCode::GameAlreadyStarted,
            GameError::SessionNotFound => ErrorCode::MatchNotFound,
            GameError::MatchEnded => ErrorCode::MatchEnded,
            GameError::InvalidMatchId => ErrorCode::InvalidMatchId,
        }
    }
}

impl From<GameError> for ServerError {
    fn from(err: GameError) -> Self {
        Self {
            code: ErrorCode::from(&err),
            message: err.to_string(),
        }
    }
}

impl ServerResponse {
    /// Wrap a typed service result.
    pub fn from_result<T>(result: Result<T, GameError>, payload: impl FnOnce(T) -> ResponsePayload) -> Self {
        match result {
            Ok(value) => ServerResponse::Ok(payload(value)),
            Err(err) => ServerResponse::Error(err.into()),
        }
    }

    /// Error code, if this is a refusal.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ServerResponse::Ok(_) => None,
            ServerResponse::Error(err) => Some(err.code),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientRequest {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerResponse {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{instantiate, Element};

    #[test]
    fn test_client_request_json() {
        let json = r#"{"type":"provoke_army","match_id":"m1","user_id":7,"element":"Sand"}"#;
        let parsed = ClientRequest::from_json(json).unwrap();
        assert_eq!(
            parsed,
            ClientRequest::ProvokeArmy {
                match_id: "m1".to_string(),
                user_id: UserId::new(7),
                element: "Sand".to_string(),
            }
        );
        assert_eq!(ClientRequest::from_json(&parsed.to_json().unwrap()).unwrap(), parsed);
    }

    #[test]
    fn test_error_codes() {
        let response = ServerResponse::Error(GameError::NotYourTurn.into());
        let json = response.to_json().unwrap();
        assert!(json.contains("not_your_turn"));
        assert_eq!(response.error_code(), Some(ErrorCode::NotYourTurn));

        let mismatch: ServerError = GameError::ElementMismatch {
            part: Element::Water,
            dino: Element::Sand,
        }
        .into();
        assert_eq!(mismatch.code, ErrorCode::ElementMismatch);
        assert!(mismatch.message.contains("water"));
    }

    #[test]
    fn test_binary_response() {
        let hand: Vec<CardInstance> = [11, 17, 21]
            .into_iter()
            .filter_map(|id| instantiate(CardId::new(id)))
            .collect();
        let response = ServerResponse::Ok(ResponsePayload::PlayerHand(hand));

        let bytes = response.to_bytes().unwrap();
        assert_eq!(ServerResponse::from_bytes(&bytes).unwrap(), response);
    }

    #[test]
    fn test_event_message_json() {
        let msg = ServerMessage::Event {
            match_id: MatchId::parse("m1").unwrap(),
            event: GameEvent::TurnChanged {
                turn_owner: UserId::new(2),
                turn_number: 3,
            },
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"event\""));
        assert!(json.contains("\"event\":\"turn_changed\""));
    }
}

//! Game Errors
//!
//! Rule violations and structural failures of match operations. These are
//! ordinary results of play and are returned, never raised.

use crate::core::ids::{CardId, UserId};
use crate::game::card::Element;

/// Why a match operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Caller does not own the current turn.
    #[error("Not your turn")]
    NotYourTurn,

    /// Draws plus plays already reached the turn budget.
    #[error("No actions left this turn")]
    ActionBudgetExhausted,

    /// Card plays already reached the per-turn limit.
    #[error("No card plays left this turn")]
    PlayLimitReached,

    /// Provoke must be the first and only action of a turn.
    #[error("Provoke is not allowed now")]
    ProvokeNotAllowed,

    /// Card is not in the caller's hand.
    #[error("{0} is not in hand")]
    CardNotInHand(CardId),

    /// Card has the wrong role for this action.
    #[error("{0} cannot be used this way")]
    WrongRole(CardId),

    /// Body part and dino elements differ.
    #[error("Element mismatch: part is {part}, dino is {dino}")]
    ElementMismatch {
        /// Element of the body part
        part: Element,
        /// Element of the target dino
        dino: Element,
    },

    /// Dino's current parts do not accept this part.
    #[error("{0} does not fit this dino")]
    IncompatibleBodyPart(CardId),

    /// No dino of the caller has this head.
    #[error("No dino with head {0}")]
    DinoNotFound(CardId),

    /// Draw deck is exhausted.
    #[error("Draw deck is empty")]
    EmptyDeck,

    /// Pile index outside the legacy pile range.
    #[error("Invalid pile index {0}")]
    InvalidPile(usize),

    /// Provoked army holds no cards.
    #[error("The {0} army is empty")]
    EmptyArmy(Element),

    /// Card id is not in the catalog.
    #[error("Unknown {0}")]
    UnknownCard(CardId),

    /// User is not seated in this match.
    #[error("{0} is not in this match")]
    PlayerNotFound(UserId),

    /// Roster size outside the allowed range.
    #[error("Invalid player count: {0}")]
    InvalidPlayerCount(usize),

    /// Same user listed twice, or an invalid user id.
    #[error("Invalid or duplicate player {0}")]
    InvalidPlayer(UserId),

    /// Game has not been started.
    #[error("Game not started")]
    GameNotStarted,

    /// Game was already started.
    #[error("Game already started")]
    GameAlreadyStarted,

    /// No session with this match id.
    #[error("Session not found")]
    SessionNotFound,

    /// Match has already ended.
    #[error("Match has ended")]
    MatchEnded,

    /// Match id failed validation.
    #[error("Invalid match id")]
    InvalidMatchId,
}

/// Result alias for match operations.
pub type GameResult<T> = Result<T, GameError>;

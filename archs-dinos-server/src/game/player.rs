//! Player State
//!
//! Per-player hand, assembled dinos and score. Holdings sit behind their own
//! lock so that snapshot queries never observe a half-applied action.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::ids::{CardId, UserId};
use crate::game::card::{BodyPartKind, CardInstance, ChestKind, Element};
use crate::game::error::{GameError, GameResult};

// =============================================================================
// DINO
// =============================================================================

/// A creature assembled from one head and any attached body parts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DinoInstance {
    /// Match-unique, monotonically assigned id
    pub instance_id: u32,
    /// Element, fixed by the head
    pub element: Element,
    /// Head card
    pub head: CardInstance,
    /// Attached parts in attachment order
    pub parts: Vec<CardInstance>,
}

impl DinoInstance {
    /// Start a dino from a head card.
    pub fn new(instance_id: u32, head: CardInstance) -> Self {
        Self {
            instance_id,
            element: head.element,
            head,
            parts: Vec::new(),
        }
    }

    /// Head power plus every attached part.
    pub fn total_power(&self) -> u32 {
        self.head.power as u32 + self.parts.iter().map(|p| p.power as u32).sum::<u32>()
    }

    /// Chest variant, if a chest is attached.
    pub fn chest(&self) -> Option<ChestKind> {
        self.parts.iter().find_map(|p| match p.role.body_part() {
            Some(BodyPartKind::Chest(kind)) => Some(kind),
            _ => None,
        })
    }

    /// Check whether `part` may be attached right now.
    pub fn check_attach(&self, part: &CardInstance) -> GameResult<()> {
        let kind = part.role.body_part().ok_or(GameError::WrongRole(part.id))?;

        if part.element != self.element {
            return Err(GameError::ElementMismatch {
                part: part.element,
                dino: self.element,
            });
        }

        let slot_taken = self
            .parts
            .iter()
            .filter_map(|p| p.role.body_part())
            .any(|existing| existing.same_slot(kind));
        if slot_taken {
            return Err(GameError::IncompatibleBodyPart(part.id));
        }

        let fits = match kind {
            BodyPartKind::Chest(_) => true,
            limb => self.chest().is_some_and(|chest| chest.accepts(limb)),
        };
        if fits {
            Ok(())
        } else {
            Err(GameError::IncompatibleBodyPart(part.id))
        }
    }

    /// Attach a part after [`check_attach`](Self::check_attach) succeeded.
    pub fn attach(&mut self, part: CardInstance) {
        self.parts.push(part);
    }

    /// Break the dino back into its cards, head first.
    pub fn into_cards(self) -> Vec<CardInstance> {
        let mut cards = Vec::with_capacity(self.parts.len() + 1);
        cards.push(self.head);
        cards.extend(self.parts);
        cards
    }
}

// =============================================================================
// PLAYER SESSION
// =============================================================================

/// Mutable per-player collections.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Holdings {
    /// Points earned from battles
    pub score: u32,
    /// Cards in hand (unordered)
    pub hand: Vec<CardInstance>,
    /// Assembled dinos
    pub dinos: Vec<DinoInstance>,
}

impl Holdings {
    /// Find a card in hand.
    pub fn find_in_hand(&self, card_id: CardId) -> Option<&CardInstance> {
        self.hand.iter().find(|c| c.id == card_id)
    }

    /// Remove a card from hand.
    pub fn take_from_hand(&mut self, card_id: CardId) -> Option<CardInstance> {
        let pos = self.hand.iter().position(|c| c.id == card_id)?;
        Some(self.hand.remove(pos))
    }

    /// Dino whose head is `head_id`.
    pub fn dino_by_head_mut(&mut self, head_id: CardId) -> Option<&mut DinoInstance> {
        self.dinos.iter_mut().find(|d| d.head.id == head_id)
    }

    /// Combined power of all dinos of one element.
    pub fn element_power(&self, element: Element) -> u32 {
        self.dinos
            .iter()
            .filter(|d| d.element == element)
            .map(DinoInstance::total_power)
            .sum()
    }

    /// Remove and return every dino of one element.
    pub fn take_dinos_of(&mut self, element: Element) -> Vec<DinoInstance> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.dinos)
            .into_iter()
            .partition(|d| d.element == element);
        self.dinos = kept;
        taken
    }

    /// Every card held, for discarding.
    pub fn drain_cards(&mut self) -> Vec<CardInstance> {
        let mut cards: Vec<CardInstance> = self.hand.drain(..).collect();
        for dino in self.dinos.drain(..) {
            cards.extend(dino.into_cards());
        }
        cards
    }
}

/// One seat in a match.
#[derive(Debug)]
pub struct PlayerSession {
    user_id: UserId,
    turn_order: usize,
    holdings: Mutex<Holdings>,
}

impl PlayerSession {
    /// Seat a player with an empty hand.
    pub fn new(user_id: UserId, turn_order: usize) -> Self {
        Self {
            user_id,
            turn_order,
            holdings: Mutex::new(Holdings::default()),
        }
    }

    /// Account id.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Seat number assigned at setup (arrival order).
    pub fn turn_order(&self) -> usize {
        self.turn_order
    }

    /// Lock the holdings for reading or mutation.
    pub fn holdings(&self) -> MutexGuard<'_, Holdings> {
        self.holdings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the hand.
    pub fn hand(&self) -> Vec<CardInstance> {
        self.holdings().hand.clone()
    }

    /// Current score.
    pub fn score(&self) -> u32 {
        self.holdings().score
    }

    /// Public view, without hand contents.
    pub fn summary(&self) -> PlayerSummary {
        let holdings = self.holdings();
        PlayerSummary {
            user_id: self.user_id,
            turn_order: self.turn_order,
            score: holdings.score,
            hand_size: holdings.hand.len(),
            dinos: holdings.dinos.clone(),
        }
    }
}

/// Information every participant may see about a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Account id
    pub user_id: UserId,
    /// Seat number
    pub turn_order: usize,
    /// Score
    pub score: u32,
    /// Number of cards in hand
    pub hand_size: usize,
    /// Assembled dinos
    pub dinos: Vec<DinoInstance>,
}

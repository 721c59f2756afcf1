//! Player Actions
//!
//! Draw, play a head, attach a body part, end the turn, and expel a player.
//! Each action checks legality through the turn rules first and mutates
//! nothing when refused.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::ids::{CardId, UserId};
use crate::game::card::{definition_for, instantiate, CardInstance, Role};
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::DinoInstance;
use crate::game::rules::{check_draw, check_end_turn, check_play, start_turn};
use crate::game::state::MatchState;

/// Result of a draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    /// The card drawn
    pub card: CardInstance,
    /// False when the card was an Arch and went to the board
    pub to_hand: bool,
    /// Cards left in the deck
    pub deck_remaining: usize,
}

/// Draw the top card of the shared deck.
///
/// `pile_index` is accepted for older clients that addressed three piles;
/// every valid index reads the same deck.
pub fn draw_card(state: &mut MatchState, user: UserId, pile_index: usize) -> GameResult<DrawOutcome> {
    check_draw(state, user)?;
    if pile_index >= state.rules.legacy_pile_count {
        return Err(GameError::InvalidPile(pile_index));
    }
    let player = state.player(user).cloned().ok_or(GameError::PlayerNotFound(user))?;

    let card = loop {
        let id = state.deck.pop().ok_or(GameError::EmptyDeck)?;
        match instantiate(id) {
            Some(card) => break card,
            None => warn!(match_id = %state.match_id, %id, "skipping unknown card in deck"),
        }
    };

    state.counters.draws += 1;
    let to_hand = !card.role.is_arch();
    if to_hand {
        player.holdings().hand.push(card);
    } else {
        state.board.add_arch(card);
        let army_power = state.board.army_power(card.element);
        state.push_event(GameEvent::ArchAddedToBoard { card, army_power });
    }

    let deck_remaining = state.deck.len();
    debug!(match_id = %state.match_id, %user, card = %card.id, to_hand, deck_remaining, "card drawn");
    state.push_event(GameEvent::CardDrawn {
        user_id: user,
        card,
        to_hand,
        deck_remaining,
    });

    Ok(DrawOutcome {
        card,
        to_hand,
        deck_remaining,
    })
}

/// Play a head card from hand as a new dino.
pub fn play_dino_head(state: &mut MatchState, user: UserId, card_id: CardId) -> GameResult<DinoInstance> {
    check_play(state, user)?;
    known_card(card_id)?;
    let player = state.player(user).cloned().ok_or(GameError::PlayerNotFound(user))?;
    let mut holdings = player.holdings();

    let card = holdings
        .find_in_hand(card_id)
        .copied()
        .ok_or(GameError::CardNotInHand(card_id))?;
    if card.role != Role::DinoHead {
        return Err(GameError::WrongRole(card_id));
    }

    holdings.take_from_hand(card_id);
    let dino = DinoInstance::new(state.next_dino_id(), card);
    holdings.dinos.push(dino.clone());
    drop(holdings);

    state.counters.plays += 1;
    debug!(match_id = %state.match_id, %user, head = %card_id, dino = dino.instance_id, "dino head played");
    state.push_event(GameEvent::DinoHeadPlayed {
        user_id: user,
        dino: dino.clone(),
    });

    Ok(dino)
}

/// Attach a body part from hand to the dino whose head is `head_id`.
///
/// Returns the dino after attachment.
pub fn attach_body_part(
    state: &mut MatchState,
    user: UserId,
    body_id: CardId,
    head_id: CardId,
) -> GameResult<DinoInstance> {
    check_play(state, user)?;
    known_card(body_id)?;
    known_card(head_id)?;
    let player = state.player(user).cloned().ok_or(GameError::PlayerNotFound(user))?;
    let mut holdings = player.holdings();

    let part = holdings
        .find_in_hand(body_id)
        .copied()
        .ok_or(GameError::CardNotInHand(body_id))?;
    if part.role.body_part().is_none() {
        return Err(GameError::WrongRole(body_id));
    }

    holdings
        .dinos
        .iter()
        .find(|d| d.head.id == head_id)
        .ok_or(GameError::DinoNotFound(head_id))?
        .check_attach(&part)?;

    holdings.take_from_hand(body_id);
    let dino = holdings
        .dino_by_head_mut(head_id)
        .ok_or(GameError::DinoNotFound(head_id))?;
    dino.attach(part);
    let updated = dino.clone();
    drop(holdings);

    state.counters.plays += 1;
    debug!(match_id = %state.match_id, %user, part = %body_id, head = %head_id, "body part attached");
    state.push_event(GameEvent::BodyPartAttached {
        user_id: user,
        head_id,
        part,
        total_power: updated.total_power(),
    });

    Ok(updated)
}

fn known_card(id: CardId) -> GameResult<()> {
    definition_for(id)
        .map(|_| ())
        .ok_or(GameError::UnknownCard(id))
}

/// Pass the turn to the next player in turn order.
pub fn end_turn(state: &mut MatchState, user: UserId) -> GameResult<UserId> {
    check_end_turn(state, user)?;
    let next = state.next_after(user).ok_or(GameError::PlayerNotFound(user))?;
    start_turn(state, next);
    state.push_event(GameEvent::TurnChanged {
        turn_owner: next,
        turn_number: state.turn_number,
    });
    Ok(next)
}

/// Remove a player, discarding everything they hold.
///
/// If they held the turn it passes to the player seated after them.
/// Returns the new turn owner when the turn moved.
pub fn expel_player(state: &mut MatchState, user: UserId, reason: &str) -> GameResult<Option<UserId>> {
    let seat = state.seat_of(user).ok_or(GameError::PlayerNotFound(user))?;
    let player = state.players.remove(seat);
    let cards = player.holdings().drain_cards();
    let discarded = cards.len();
    state.discard.extend(cards);

    info!(match_id = %state.match_id, %user, discarded, reason, "player expelled");
    state.push_event(GameEvent::PlayerExpelled {
        user_id: user,
        reason: reason.to_string(),
    });

    if state.turn_owner != Some(user) {
        return Ok(None);
    }
    if state.players.is_empty() || !state.is_started() {
        state.turn_owner = None;
        return Ok(None);
    }

    let next = state.players[seat % state.players.len()].user_id();
    start_turn(state, next);
    state.push_event(GameEvent::TurnChanged {
        turn_owner: next,
        turn_number: state.turn_number,
    });
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::Element;
    use crate::game::state::test_support::{give, started_state};

    // Sand ids: arch 1-8, heads 9-14 (11 = power 2), complete chest 15,
    // arms chest 17, arms+legs chest 19, left arm 21, right arm 25, legs 29.

    #[test]
    fn test_draw_to_hand() {
        let (mut state, a, _) = started_state();
        state.deck = vec![CardId::new(12), CardId::new(11)];

        let outcome = draw_card(&mut state, a, 0).unwrap();
        assert_eq!(outcome.card.id, CardId::new(11));
        assert!(outcome.to_hand);
        assert_eq!(outcome.deck_remaining, 1);
        assert_eq!(state.player(a).unwrap().hand().len(), 1);
        assert_eq!(state.counters.draws, 1);
    }

    #[test]
    fn test_drawn_arch_goes_to_board() {
        let (mut state, a, _) = started_state();
        state.deck = vec![CardId::new(33)];

        let outcome = draw_card(&mut state, a, 2).unwrap();
        assert!(!outcome.to_hand);
        assert!(state.player(a).unwrap().hand().is_empty());
        assert_eq!(state.board.army(Element::Water).len(), 1);
        assert_eq!(state.counters.draws, 1);

        let events = state.take_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::ArchAddedToBoard { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::CardDrawn { to_hand: false, .. })));
    }

    #[test]
    fn test_draw_refusals() {
        let (mut state, a, b) = started_state();
        assert_eq!(draw_card(&mut state, a, 0), Err(GameError::EmptyDeck));
        assert_eq!(state.counters.draws, 0);

        state.deck = vec![CardId::new(11)];
        assert_eq!(draw_card(&mut state, b, 0), Err(GameError::NotYourTurn));
        assert_eq!(draw_card(&mut state, a, 3), Err(GameError::InvalidPile(3)));
        assert_eq!(state.deck.len(), 1);
    }

    #[test]
    fn test_draw_budget_exhausts() {
        let (mut state, a, _) = started_state();
        state.deck = (9..=14).map(CardId::new).collect();
        for _ in 0..3 {
            draw_card(&mut state, a, 0).unwrap();
        }
        assert_eq!(draw_card(&mut state, a, 0), Err(GameError::ActionBudgetExhausted));
    }

    #[test]
    fn test_play_head() {
        let (mut state, a, _) = started_state();
        give(&state, a, &[11, 17]);

        let dino = play_dino_head(&mut state, a, CardId::new(11)).unwrap();
        assert_eq!(dino.element, Element::Sand);
        assert_eq!(dino.total_power(), 2);
        assert_eq!(state.counters.plays, 1);

        let holdings = state.player(a).unwrap().holdings();
        assert_eq!(holdings.hand.len(), 1);
        assert_eq!(holdings.dinos.len(), 1);
    }

    #[test]
    fn test_play_head_refusals() {
        let (mut state, a, _) = started_state();
        give(&state, a, &[17]);
        assert_eq!(
            play_dino_head(&mut state, a, CardId::new(11)),
            Err(GameError::CardNotInHand(CardId::new(11)))
        );
        assert_eq!(
            play_dino_head(&mut state, a, CardId::new(17)),
            Err(GameError::WrongRole(CardId::new(17)))
        );
        assert_eq!(
            play_dino_head(&mut state, a, CardId::new(500)),
            Err(GameError::UnknownCard(CardId::new(500)))
        );
        assert_eq!(state.counters.plays, 0);
        assert_eq!(state.player(a).unwrap().hand().len(), 1);
    }

    #[test]
    fn test_dino_instance_ids_increase() {
        let (mut state, a, _) = started_state();
        give(&state, a, &[11, 12]);
        let first = play_dino_head(&mut state, a, CardId::new(11)).unwrap();
        let second = play_dino_head(&mut state, a, CardId::new(12)).unwrap();
        assert!(second.instance_id > first.instance_id);
    }

    #[test]
    fn test_assembled_dino_reaches_power_four() {
        let (mut state, a, b) = started_state();
        give(&state, a, &[11, 17, 21]);

        play_dino_head(&mut state, a, CardId::new(11)).unwrap();
        attach_body_part(&mut state, a, CardId::new(17), CardId::new(11)).unwrap();
        // Two plays used; the arm waits for the next turn.
        assert_eq!(
            attach_body_part(&mut state, a, CardId::new(21), CardId::new(11)),
            Err(GameError::PlayLimitReached)
        );

        end_turn(&mut state, a).unwrap();
        end_turn(&mut state, b).unwrap();

        let dino = attach_body_part(&mut state, a, CardId::new(21), CardId::new(11)).unwrap();
        assert_eq!(dino.total_power(), 4);
        assert!(state.player(a).unwrap().hand().is_empty());
    }

    #[test]
    fn test_attach_element_mismatch_fails() {
        let (mut state, a, _) = started_state();
        give(&state, a, &[11, 49]); // 49 = Water arms chest
        play_dino_head(&mut state, a, CardId::new(11)).unwrap();

        let result = attach_body_part(&mut state, a, CardId::new(49), CardId::new(11));
        assert!(matches!(result, Err(GameError::ElementMismatch { .. })));
        assert_eq!(state.counters.plays, 1);
        assert_eq!(state.player(a).unwrap().hand().len(), 1);
    }

    #[test]
    fn test_attach_after_complete_chest_fails() {
        let (mut state, a, b) = started_state();
        give(&state, a, &[11, 15, 21]);
        play_dino_head(&mut state, a, CardId::new(11)).unwrap();
        attach_body_part(&mut state, a, CardId::new(15), CardId::new(11)).unwrap();
        end_turn(&mut state, a).unwrap();
        end_turn(&mut state, b).unwrap();

        assert_eq!(
            attach_body_part(&mut state, a, CardId::new(21), CardId::new(11)),
            Err(GameError::IncompatibleBodyPart(CardId::new(21)))
        );
    }

    #[test]
    fn test_attach_refusals() {
        let (mut state, a, _) = started_state();
        give(&state, a, &[11, 12, 17]);
        play_dino_head(&mut state, a, CardId::new(11)).unwrap();

        assert_eq!(
            attach_body_part(&mut state, a, CardId::new(12), CardId::new(11)),
            Err(GameError::WrongRole(CardId::new(12)))
        );
        assert_eq!(
            attach_body_part(&mut state, a, CardId::new(17), CardId::new(13)),
            Err(GameError::DinoNotFound(CardId::new(13)))
        );
        assert_eq!(
            attach_body_part(&mut state, a, CardId::new(19), CardId::new(11)),
            Err(GameError::CardNotInHand(CardId::new(19)))
        );
        assert_eq!(
            attach_body_part(&mut state, a, CardId::new(17), CardId::new(0)),
            Err(GameError::UnknownCard(CardId::new(0)))
        );
    }

    #[test]
    fn test_end_turn_rotates() {
        let (mut state, a, b) = started_state();
        assert_eq!(end_turn(&mut state, b), Err(GameError::NotYourTurn));
        assert_eq!(end_turn(&mut state, a), Ok(b));
        assert_eq!(state.turn_number, 2);
        assert_eq!(end_turn(&mut state, b), Ok(a));
    }

    #[test]
    fn test_expel_turn_owner_passes_turn() {
        let (mut state, a, b) = started_state();
        give(&state, a, &[11, 17]);
        play_dino_head(&mut state, a, CardId::new(11)).unwrap();

        let next = expel_player(&mut state, a, "disconnected").unwrap();
        assert_eq!(next, Some(b));
        assert_eq!(state.turn_owner, Some(b));
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.discard.len(), 2);
        assert_eq!(expel_player(&mut state, a, "again"), Err(GameError::PlayerNotFound(a)));
    }

    #[test]
    fn test_expel_other_player_keeps_turn() {
        let (mut state, a, b) = started_state();
        assert_eq!(expel_player(&mut state, b, "left"), Ok(None));
        assert_eq!(state.turn_owner, Some(a));
    }
}

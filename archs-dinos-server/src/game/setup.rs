//! Match Setup
//!
//! Seats the roster, shuffles the catalog and deals opening hands. Arch
//! cards met while dealing go straight to the central board and do not
//! count toward the hand.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::ids::{CardId, UserId};
use crate::game::card::{all_ids, instantiate};
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::PlayerSession;
use crate::game::rules::start_turn;
use crate::game::state::{MatchPhase, MatchState};

/// Outcome of a successful deal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupReport {
    /// Roster in turn order
    pub players: Vec<UserId>,
    /// Arch cards diverted to the board while dealing
    pub arches_on_board: usize,
    /// Cards left in the draw deck
    pub deck_size: usize,
}

fn validate_roster(state: &MatchState, players: &[UserId]) -> GameResult<()> {
    if !state.rules.roster_ok(players.len()) {
        return Err(GameError::InvalidPlayerCount(players.len()));
    }
    let mut seen = BTreeSet::new();
    for &user in players {
        if !user.is_valid() || !seen.insert(user) {
            return Err(GameError::InvalidPlayer(user));
        }
    }
    Ok(())
}

/// Seat `players` and deal from a freshly shuffled catalog.
///
/// Refuses without touching the state when the roster is invalid.
pub fn setup_game(state: &mut MatchState, players: &[UserId]) -> GameResult<SetupReport> {
    validate_roster(state, players)?;
    let mut ids = all_ids();
    state.rng.shuffle(&mut ids);
    deal(state, players, ids)
}

/// Seat `players` and deal from `ordered` (first element dealt first).
///
/// Any previous seating is cleared. Each player in turn order receives cards
/// until holding `hand_size` non-Arch cards or the cards run out; the rest
/// becomes the draw deck.
pub fn deal(
    state: &mut MatchState,
    players: &[UserId],
    ordered: Vec<CardId>,
) -> GameResult<SetupReport> {
    validate_roster(state, players)?;
    state.reset();

    state.players = players
        .iter()
        .enumerate()
        .map(|(seat, &user)| Arc::new(PlayerSession::new(user, seat)))
        .collect();

    let hand_size = state.rules.hand_size;
    let mut cards = ordered.into_iter();
    let mut arches_on_board = 0;

    for player in &state.players {
        let mut holdings = player.holdings();
        while holdings.hand.len() < hand_size {
            let Some(id) = cards.next() else { break };
            let Some(card) = instantiate(id) else {
                warn!(match_id = %state.match_id, %id, "skipping unknown card while dealing");
                continue;
            };
            if card.role.is_arch() {
                state.board.add_arch(card);
                arches_on_board += 1;
            } else {
                holdings.hand.push(card);
            }
        }
    }

    // Top of the deck is the last element, so reverse to keep deal order.
    let mut deck: Vec<CardId> = cards.collect();
    deck.reverse();
    state.deck = deck;
    state.phase = MatchPhase::Dealt;

    let report = SetupReport {
        players: players.to_vec(),
        arches_on_board,
        deck_size: state.deck.len(),
    };

    info!(
        match_id = %state.match_id,
        players = report.players.len(),
        arches = report.arches_on_board,
        deck = report.deck_size,
        "match dealt"
    );
    state.push_event(GameEvent::SessionInitialized {
        players: report.players.clone(),
    });

    Ok(report)
}

/// Uniform random pick among seated players, independent of seat order.
pub fn choose_first_player(state: &mut MatchState) -> Option<UserId> {
    let ids = state.player_ids();
    state.rng.choose(&ids).copied()
}

/// Begin play: pick the first player, stamp the start time, open turn one.
pub fn start_game(state: &mut MatchState, now: DateTime<Utc>) -> GameResult<UserId> {
    match state.phase {
        MatchPhase::Dealt => {}
        MatchPhase::Created => return Err(GameError::InvalidPlayerCount(0)),
        MatchPhase::Playing | MatchPhase::Ended => return Err(GameError::GameAlreadyStarted),
    }

    // Expulsions before the start can shrink the roster below the minimum.
    if !state.rules.roster_ok(state.players.len()) {
        return Err(GameError::InvalidPlayerCount(state.players.len()));
    }
    let first = choose_first_player(state).ok_or(GameError::InvalidPlayerCount(0))?;
    state.phase = MatchPhase::Playing;
    state.started_at = Some(now);
    start_turn(state, first);

    info!(match_id = %state.match_id, %first, "match started");
    state.push_event(GameEvent::TurnChanged {
        turn_owner: first,
        turn_number: state.turn_number,
    });

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::MatchId;
    use crate::core::rng::DeterministicRng;
    use crate::game::card::{Element, CATALOG_SIZE};
    use crate::game::rules::GameRules;
    use proptest::prelude::*;

    fn fresh_state(seed: u64) -> MatchState {
        MatchState::new(
            MatchId::parse("setup-test").unwrap(),
            GameRules::default(),
            DeterministicRng::new(seed),
        )
    }

    fn roster(n: u32) -> Vec<UserId> {
        (1..=n).map(UserId::new).collect()
    }

    fn total_cards(state: &MatchState) -> usize {
        let held: usize = state.players.iter().map(|p| p.holdings().hand.len()).sum();
        held + state.deck.len() + state.board.card_count() + state.discard.len()
    }

    #[test]
    fn test_rejects_bad_roster_without_mutation() {
        let mut state = fresh_state(1);
        state.deck.push(CardId::new(1));

        assert_eq!(
            setup_game(&mut state, &roster(1)),
            Err(GameError::InvalidPlayerCount(1))
        );
        assert_eq!(
            setup_game(&mut state, &roster(5)),
            Err(GameError::InvalidPlayerCount(5))
        );
        let dup = [UserId::new(1), UserId::new(1)];
        assert_eq!(
            setup_game(&mut state, &dup),
            Err(GameError::InvalidPlayer(UserId::new(1)))
        );
        assert_eq!(state.deck.len(), 1);
        assert_eq!(state.phase, MatchPhase::Created);
    }

    #[test]
    fn test_turn_order_follows_arrival() {
        let mut state = fresh_state(2);
        let players = [UserId::new(30), UserId::new(10), UserId::new(20)];
        setup_game(&mut state, &players).unwrap();
        assert_eq!(state.player_ids(), players.to_vec());
        for (seat, p) in state.players.iter().enumerate() {
            assert_eq!(p.turn_order(), seat);
        }
    }

    #[test]
    fn test_dealt_arches_go_to_board() {
        let mut state = fresh_state(3);
        // 1 and 2 are Sand arches, 33 is a Water arch.
        let ordered: Vec<CardId> = [1, 11, 33, 12, 2, 15, 17, 21, 41, 42, 43, 44, 45, 60]
            .into_iter()
            .map(CardId::new)
            .collect();
        let report = deal(&mut state, &roster(2), ordered).unwrap();

        assert_eq!(report.arches_on_board, 3);
        assert_eq!(state.board.army(Element::Sand).len(), 2);
        assert_eq!(state.board.army(Element::Water).len(), 1);

        let a = state.players[0].hand();
        let ids: Vec<u16> = a.iter().map(|c| c.id.raw()).collect();
        assert_eq!(ids, vec![11, 12, 15, 17, 21]);
        assert_eq!(state.players[1].hand().len(), 5);

        // 60 is the only card left and is now the top of the deck
        assert_eq!(state.deck, vec![CardId::new(60)]);
    }

    #[test]
    fn test_short_deck_stops_dealing() {
        let mut state = fresh_state(4);
        let ordered: Vec<CardId> = [11, 12, 13].into_iter().map(CardId::new).collect();
        let report = deal(&mut state, &roster(2), ordered).unwrap();
        assert_eq!(state.players[0].hand().len(), 3);
        assert!(state.players[1].hand().is_empty());
        assert_eq!(report.deck_size, 0);
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let mut state = fresh_state(5);
        let ordered: Vec<CardId> = [999, 11, 12, 13, 14, 15, 16]
            .into_iter()
            .map(CardId::new)
            .collect();
        deal(&mut state, &roster(2), ordered).unwrap();
        assert_eq!(state.players[0].hand().len(), 5);
    }

    #[test]
    fn test_redeal_reuses_session() {
        let mut state = fresh_state(6);
        setup_game(&mut state, &roster(4)).unwrap();
        setup_game(&mut state, &roster(2)).unwrap();
        assert_eq!(state.players.len(), 2);
        assert_eq!(total_cards(&state), CATALOG_SIZE);
    }

    #[test]
    fn test_start_game_picks_seated_player() {
        let mut state = fresh_state(7);
        setup_game(&mut state, &roster(3)).unwrap();
        let now = Utc::now();
        let first = start_game(&mut state, now).unwrap();

        assert!(state.player(first).is_some());
        assert_eq!(state.turn_owner, Some(first));
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.started_at, Some(now));
        assert_eq!(start_game(&mut state, now), Err(GameError::GameAlreadyStarted));
    }

    #[test]
    fn test_start_requires_deal() {
        let mut state = fresh_state(8);
        assert!(start_game(&mut state, Utc::now()).is_err());
    }

    #[test]
    fn test_first_player_is_not_always_seat_zero() {
        let firsts: BTreeSet<UserId> = (0..64)
            .map(|seed| {
                let mut state = fresh_state(seed);
                setup_game(&mut state, &roster(4)).unwrap();
                choose_first_player(&mut state).unwrap()
            })
            .collect();
        assert!(firsts.len() > 1);
    }

    proptest! {
        #[test]
        fn prop_setup_invariants(seed in any::<u64>(), n in 2u32..=4) {
            let mut state = fresh_state(seed);
            setup_game(&mut state, &roster(n)).unwrap();

            for player in &state.players {
                let hand = player.hand();
                prop_assert_eq!(hand.len(), 5);
                prop_assert!(hand.iter().all(|c| !c.role.is_arch()));
            }
            for element in Element::ALL {
                prop_assert!(state.board.army(element).iter().all(|c| c.element == element && c.role.is_arch()));
            }
            prop_assert_eq!(total_cards(&state), CATALOG_SIZE);
        }
    }
}

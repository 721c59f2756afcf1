//! Battle Resolution
//!
//! Provoking an elemental army pits its combined Arch power against the
//! strongest player's dinos of that element. Dinos win ties. Whatever the
//! outcome, the army and every contesting dino of every player are
//! discarded.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::ids::UserId;
use crate::game::card::{CardInstance, Element};
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::DinoInstance;
use crate::game::rules::check_provoke;
use crate::game::state::MatchState;

/// One player's stake in a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contender {
    /// Player
    pub user_id: UserId,
    /// Combined power of their dinos of the contested element
    pub power: u32,
    /// Dinos that fought (and were discarded)
    pub dinos: Vec<DinoInstance>,
}

/// Full record of a resolved battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    /// Contested element
    pub element: Element,
    /// Combined power of the army
    pub arch_power: u32,
    /// True when the best dino power met or beat the army
    pub dinos_won: bool,
    /// Player credited with the win
    pub winner: Option<UserId>,
    /// Highest per-player dino power (0 if nobody contested)
    pub winner_power: u32,
    /// Points awarded to the winner
    pub points_awarded: u32,
    /// Arch cards discarded
    pub discarded_arches: Vec<CardInstance>,
    /// Every player, in turn order, with their contesting dinos
    pub contenders: Vec<Contender>,
}

/// Resolve a battle against the `element` army.
///
/// Does not check turn legality; see [`provoke`] for the player action.
pub fn resolve_battle(state: &mut MatchState, element: Element) -> GameResult<BattleResult> {
    if state.board.army(element).is_empty() {
        return Err(GameError::EmptyArmy(element));
    }
    let arch_power = state.board.army_power(element);

    // Turn order breaks ties between players: strictly greater wins.
    let mut winner: Option<UserId> = None;
    let mut winner_power = 0;
    let mut contenders = Vec::with_capacity(state.players.len());
    for player in &state.players {
        let power = player.holdings().element_power(element);
        if power > winner_power {
            winner_power = power;
            winner = Some(player.user_id());
        }
        contenders.push(Contender {
            user_id: player.user_id(),
            power,
            dinos: Vec::new(),
        });
    }

    let dinos_won = winner_power >= arch_power;
    let winner = if dinos_won && winner_power > 0 { winner } else { None };
    let mut points_awarded = 0;

    for (player, contender) in state.players.iter().zip(contenders.iter_mut()) {
        let mut holdings = player.holdings();
        if winner == Some(player.user_id()) {
            holdings.score += arch_power;
            points_awarded = arch_power;
        }
        contender.dinos = holdings.take_dinos_of(element);
        for dino in &contender.dinos {
            state.discard.extend(dino.clone().into_cards());
        }
    }

    let discarded_arches = state.board.take_army(element);
    state.discard.extend(discarded_arches.iter().copied());

    info!(
        match_id = %state.match_id,
        %element,
        arch_power,
        winner_power,
        dinos_won,
        winner = ?winner,
        "battle resolved"
    );

    Ok(BattleResult {
        element,
        arch_power,
        dinos_won,
        winner,
        winner_power,
        points_awarded,
        discarded_arches,
        contenders,
    })
}

/// Player action: provoke the `element` army.
///
/// Must be the first and only action of the turn; marks the main action.
pub fn provoke(state: &mut MatchState, user: UserId, element: Element) -> GameResult<BattleResult> {
    check_provoke(state, user)?;
    let result = resolve_battle(state, element)?;
    state.counters.main_action_taken = true;
    state.push_event(GameEvent::ArmyProvoked {
        provoker: user,
        result: result.clone(),
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::CardId;
    use crate::game::card::instantiate;
    use crate::game::state::test_support::{give, started_state};

    fn card(id: u16) -> CardInstance {
        instantiate(CardId::new(id)).unwrap()
    }

    fn dino(state: &mut MatchState, user: UserId, head: u16, parts: &[u16]) {
        let id = state.next_dino_id();
        let mut d = DinoInstance::new(id, card(head));
        for p in parts {
            d.attach(card(*p));
        }
        state.player(user).unwrap().holdings().dinos.push(d);
    }

    // Sand arches: 3 and 4 are power 2, 5 and 6 power 3, 8 power 5.
    // Sand heads: 9 power 1, 11 power 2, 13 power 3. 15 complete chest (3).

    #[test]
    fn test_tie_goes_to_dinos() {
        let (mut state, a, b) = started_state();
        state.board.add_arch(card(8));
        dino(&mut state, a, 11, &[15]); // 2 + 3 = 5
        dino(&mut state, b, 9, &[]); // 1

        let result = provoke(&mut state, a, Element::Sand).unwrap();
        assert_eq!(result.arch_power, 5);
        assert_eq!(result.winner_power, 5);
        assert!(result.dinos_won);
        assert_eq!(result.winner, Some(a));
        assert_eq!(result.points_awarded, 5);
        assert_eq!(state.player(a).unwrap().score(), 5);

        // Army and every contesting dino are gone, loser's included.
        assert!(state.board.army(Element::Sand).is_empty());
        assert!(state.player(a).unwrap().holdings().dinos.is_empty());
        assert!(state.player(b).unwrap().holdings().dinos.is_empty());
        assert_eq!(state.discard.len(), 1 + 2 + 1);
        assert!(state.counters.main_action_taken);
    }

    #[test]
    fn test_weaker_dinos_lose_and_are_still_discarded() {
        let (mut state, a, b) = started_state();
        state.board.add_arch(card(8));
        dino(&mut state, a, 13, &[17]); // 3 + 1 = 4
        dino(&mut state, b, 9, &[]);

        let result = provoke(&mut state, a, Element::Sand).unwrap();
        assert!(!result.dinos_won);
        assert_eq!(result.winner, None);
        assert_eq!(result.points_awarded, 0);
        assert_eq!(state.player(a).unwrap().score(), 0);
        assert!(state.player(a).unwrap().holdings().dinos.is_empty());
        assert!(state.player(b).unwrap().holdings().dinos.is_empty());
        assert!(state.board.army(Element::Sand).is_empty());
    }

    #[test]
    fn test_uncontested_army_is_discarded() {
        let (mut state, a, _) = started_state();
        state.board.add_arch(card(5)); // 3
        state.board.add_arch(card(3)); // 2
        dino(&mut state, a, 41, &[]); // Water head, not contesting

        let result = provoke(&mut state, a, Element::Sand).unwrap();
        assert_eq!(result.arch_power, 5);
        assert_eq!(result.winner_power, 0);
        assert!(!result.dinos_won);
        assert_eq!(result.winner, None);
        assert_eq!(result.discarded_arches.len(), 2);
        assert_eq!(state.discard.len(), 2);
        assert_eq!(state.player(a).unwrap().holdings().dinos.len(), 1);
        assert_eq!(state.player(a).unwrap().score(), 0);
    }

    #[test]
    fn test_empty_army_is_refused() {
        let (mut state, a, _) = started_state();
        assert_eq!(
            provoke(&mut state, a, Element::Wind),
            Err(GameError::EmptyArmy(Element::Wind))
        );
        assert!(!state.counters.main_action_taken);
    }

    #[test]
    fn test_provoke_after_draw_is_refused() {
        let (mut state, a, _) = started_state();
        state.board.add_arch(card(8));
        state.counters.draws = 1;
        assert_eq!(provoke(&mut state, a, Element::Sand), Err(GameError::ProvokeNotAllowed));
        assert_eq!(state.board.army(Element::Sand).len(), 1);
    }

    #[test]
    fn test_any_player_can_win_the_battle() {
        let (mut state, a, b) = started_state();
        state.board.add_arch(card(3)); // 2
        dino(&mut state, b, 13, &[]); // 3

        let result = provoke(&mut state, a, Element::Sand).unwrap();
        assert_eq!(result.winner, Some(b));
        assert_eq!(state.player(b).unwrap().score(), 2);
        assert_eq!(result.contenders.len(), 2);
        assert_eq!(result.contenders[1].dinos.len(), 1);
    }

    #[test]
    fn test_equal_players_favor_turn_order() {
        let (mut state, a, b) = started_state();
        state.board.add_arch(card(1)); // 1
        dino(&mut state, a, 11, &[]);
        dino(&mut state, b, 12, &[]);

        let result = resolve_battle(&mut state, Element::Sand).unwrap();
        assert_eq!(result.winner, Some(a));
    }

    #[test]
    fn test_hand_cards_are_untouched() {
        let (mut state, a, _) = started_state();
        give(&state, a, &[21]);
        state.board.add_arch(card(1));
        provoke(&mut state, a, Element::Sand).unwrap();
        assert_eq!(state.player(a).unwrap().hand().len(), 1);
    }
}

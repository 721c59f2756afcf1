//! Turn Rules
//!
//! Per-turn action budget and the legality checks every action goes
//! through. State lives in the match's turn counters; there is no separate
//! state machine.
//!
//! | Check       | Allowed when                                          |
//! |-------------|-------------------------------------------------------|
//! | draw        | owner, draws + plays < budget                         |
//! | play        | owner, plays < play limit, draws + plays < budget     |
//! | provoke     | owner, no draws, no plays, no main action yet         |
//! | end turn    | owner                                                 |

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::ids::UserId;
use crate::game::error::{GameError, GameResult};
use crate::game::state::MatchState;

/// Longest accepted match duration: one week.
pub const MAX_MATCH_DURATION_SECS: i64 = 7 * 24 * 60 * 60;

/// Tunable match rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    /// Cards dealt to each hand at setup.
    pub hand_size: usize,
    /// Draws plus plays allowed per turn.
    pub action_budget: u32,
    /// Card plays allowed per turn.
    pub max_plays_per_turn: u32,
    /// Match length limit in seconds.
    pub match_duration_secs: i64,
    /// Smallest roster.
    pub min_players: usize,
    /// Largest roster.
    pub max_players: usize,
    /// Accepted `pile_index` values on draw (all map to the one deck).
    pub legacy_pile_count: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            hand_size: 5,
            action_budget: 3,
            max_plays_per_turn: 2,
            match_duration_secs: 20 * 60,
            min_players: 2,
            max_players: 4,
            legacy_pile_count: 3,
        }
    }
}

impl GameRules {
    /// Create rules from environment variables, defaulting what is unset.
    ///
    /// Reads `AVD_HAND_SIZE`, `AVD_ACTION_BUDGET`, `AVD_MAX_PLAYS` and
    /// `AVD_MATCH_DURATION_SECS`. Unparsable or out-of-range values are
    /// logged and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            hand_size: env_in_range("AVD_HAND_SIZE", 1..=15, defaults.hand_size),
            action_budget: env_in_range("AVD_ACTION_BUDGET", 1..=10, defaults.action_budget),
            max_plays_per_turn: env_in_range("AVD_MAX_PLAYS", 1..=10, defaults.max_plays_per_turn),
            match_duration_secs: env_in_range(
                "AVD_MATCH_DURATION_SECS",
                1..=MAX_MATCH_DURATION_SECS,
                defaults.match_duration_secs,
            ),
            ..defaults
        }
    }

    /// Match length limit, clamped to `0..=MAX_MATCH_DURATION_SECS`.
    pub fn match_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.match_duration_secs.clamp(0, MAX_MATCH_DURATION_SECS))
    }

    /// Whether a roster of this size may play.
    pub fn roster_ok(&self, count: usize) -> bool {
        (self.min_players..=self.max_players).contains(&count)
    }
}

fn env_in_range<T>(key: &str, range: RangeInclusive<T>, default: T) -> T
where
    T: FromStr + PartialOrd + Display + Copy,
{
    parse_setting(key, std::env::var(key).ok().as_deref(), range, default)
}

fn parse_setting<T>(key: &str, raw: Option<&str>, range: RangeInclusive<T>, default: T) -> T
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if range.contains(&value) => value,
        _ => {
            warn!(
                key,
                value = raw,
                min = %range.start(),
                max = %range.end(),
                %default,
                "ignoring invalid setting"
            );
            default
        }
    }
}

// =============================================================================
// CHECKS
// =============================================================================

fn is_owner(state: &MatchState, user: UserId) -> bool {
    state.turn_owner == Some(user)
}

fn actions_taken(state: &MatchState) -> u32 {
    state.counters.draws + state.counters.plays
}

/// Whether `user` may draw now.
pub fn can_draw(state: &MatchState, user: UserId) -> bool {
    check_draw(state, user).is_ok()
}

/// Whether `user` may play a card now.
pub fn can_play(state: &MatchState, user: UserId) -> bool {
    check_play(state, user).is_ok()
}

/// Whether `user` may provoke an army now.
pub fn can_provoke(state: &MatchState, user: UserId) -> bool {
    check_provoke(state, user).is_ok()
}

/// Whether `user` may end the turn.
pub fn can_end_turn(state: &MatchState, user: UserId) -> bool {
    check_end_turn(state, user).is_ok()
}

fn check_owner(state: &MatchState, user: UserId) -> GameResult<()> {
    if !state.is_started() {
        return Err(GameError::GameNotStarted);
    }
    if !is_owner(state, user) {
        return Err(GameError::NotYourTurn);
    }
    Ok(())
}

/// Draw legality with the reason for refusal.
pub fn check_draw(state: &MatchState, user: UserId) -> GameResult<()> {
    check_owner(state, user)?;
    if actions_taken(state) >= state.rules.action_budget {
        return Err(GameError::ActionBudgetExhausted);
    }
    Ok(())
}

/// Play legality with the reason for refusal.
pub fn check_play(state: &MatchState, user: UserId) -> GameResult<()> {
    check_owner(state, user)?;
    if state.counters.plays >= state.rules.max_plays_per_turn {
        return Err(GameError::PlayLimitReached);
    }
    if actions_taken(state) >= state.rules.action_budget {
        return Err(GameError::ActionBudgetExhausted);
    }
    Ok(())
}

/// Provoke legality with the reason for refusal.
pub fn check_provoke(state: &MatchState, user: UserId) -> GameResult<()> {
    check_owner(state, user)?;
    let counters = &state.counters;
    if counters.draws != 0 || counters.plays != 0 || counters.main_action_taken {
        return Err(GameError::ProvokeNotAllowed);
    }
    Ok(())
}

/// End-turn legality with the reason for refusal.
pub fn check_end_turn(state: &MatchState, user: UserId) -> GameResult<()> {
    check_owner(state, user)
}

// =============================================================================
// TURN TRANSITION
// =============================================================================

/// Hand the turn to `user`, resetting the per-turn counters.
///
/// This is the only place counters are reset.
pub fn start_turn(state: &mut MatchState, user: UserId) {
    state.turn_owner = Some(user);
    state.turn_number += 1;
    state.counters = Default::default();
    debug!(match_id = %state.match_id, %user, turn = state.turn_number, "turn started");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::test_support::started_state;

    #[test]
    fn test_defaults() {
        let rules = GameRules::default();
        assert_eq!(rules.hand_size, 5);
        assert_eq!(rules.action_budget, 3);
        assert_eq!(rules.max_plays_per_turn, 2);
        assert_eq!(rules.match_duration(), chrono::Duration::minutes(20));
        assert!(rules.roster_ok(2));
        assert!(rules.roster_ok(4));
        assert!(!rules.roster_ok(1));
        assert!(!rules.roster_ok(5));
    }

    #[test]
    fn test_settings_out_of_range_fall_back() {
        assert_eq!(parse_setting("K", None, 1..=10u32, 3), 3);
        assert_eq!(parse_setting("K", Some(" 7 "), 1..=10u32, 3), 7);
        assert_eq!(parse_setting("K", Some("0"), 1..=10u32, 3), 3);
        assert_eq!(parse_setting("K", Some("eleven"), 1..=10u32, 3), 3);
        assert_eq!(
            parse_setting("K", Some("99999999999999999"), 1..=MAX_MATCH_DURATION_SECS, 1200),
            1200
        );
        assert_eq!(parse_setting("K", Some("-5"), 1..=MAX_MATCH_DURATION_SECS, 1200), 1200);
    }

    #[test]
    fn test_huge_duration_is_clamped() {
        let rules = GameRules {
            match_duration_secs: i64::MAX,
            ..GameRules::default()
        };
        assert_eq!(
            rules.match_duration(),
            chrono::Duration::seconds(MAX_MATCH_DURATION_SECS)
        );

        let rules = GameRules {
            match_duration_secs: -30,
            ..GameRules::default()
        };
        assert_eq!(rules.match_duration(), chrono::Duration::zero());
    }

    #[test]
    fn test_draw_budget() {
        let (mut state, a, b) = started_state();
        assert!(can_draw(&state, a));
        assert!(!can_draw(&state, b));

        state.counters.draws = 2;
        assert!(can_draw(&state, a));
        state.counters.draws = 3;
        assert!(!can_draw(&state, a));

        state.counters.draws = 1;
        state.counters.plays = 2;
        assert_eq!(check_draw(&state, a), Err(GameError::ActionBudgetExhausted));
        assert_eq!(check_draw(&state, b), Err(GameError::NotYourTurn));
    }

    #[test]
    fn test_play_limit() {
        let (mut state, a, _) = started_state();
        state.counters.plays = 2;
        assert_eq!(check_play(&state, a), Err(GameError::PlayLimitReached));

        state.counters.plays = 1;
        state.counters.draws = 2;
        assert_eq!(check_play(&state, a), Err(GameError::ActionBudgetExhausted));

        state.counters.draws = 1;
        assert!(can_play(&state, a));
    }

    #[test]
    fn test_provoke_must_be_first_action() {
        let (mut state, a, b) = started_state();
        assert!(can_provoke(&state, a));
        assert!(!can_provoke(&state, b));

        state.counters.draws = 1;
        assert!(!can_provoke(&state, a));

        state.counters.draws = 0;
        state.counters.plays = 1;
        assert!(!can_provoke(&state, a));

        state.counters.plays = 0;
        state.counters.main_action_taken = true;
        assert!(!can_provoke(&state, a));
    }

    #[test]
    fn test_end_turn_only_for_owner() {
        let (state, a, b) = started_state();
        assert!(can_end_turn(&state, a));
        assert!(!can_end_turn(&state, b));
    }

    #[test]
    fn test_start_turn_resets_counters() {
        let (mut state, a, b) = started_state();
        let turn = state.turn_number;
        state.counters.draws = 2;
        state.counters.plays = 1;
        state.counters.main_action_taken = true;

        start_turn(&mut state, b);
        assert_eq!(state.turn_owner, Some(b));
        assert_eq!(state.turn_number, turn + 1);
        assert_eq!(state.counters.draws, 0);
        assert_eq!(state.counters.plays, 0);
        assert!(!state.counters.main_action_taken);
        assert!(!can_draw(&state, a));
    }

    #[test]
    fn test_checks_require_started_game() {
        let (mut state, a, _) = started_state();
        state.phase = crate::game::state::MatchPhase::Dealt;
        assert_eq!(check_draw(&state, a), Err(GameError::GameNotStarted));
    }
}

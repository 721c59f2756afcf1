//! Game Service
//!
//! The request surface. Each call resolves the match, runs one game
//! operation under the match lock, then (with the lock released) fans the
//! resulting events out and retires the match if it just ended.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::core::ids::{CardId, MatchId, UserId};
use crate::game::actions::{self, DrawOutcome};
use crate::game::battle::{self, BattleResult};
use crate::game::board::BoardSnapshot;
use crate::game::card::{CardInstance, Element};
use crate::game::end::{self, GameSummary};
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::DinoInstance;
use crate::game::rules::GameRules;
use crate::game::setup::{self, SetupReport};
use crate::game::state::{GameSession, GameStateSnapshot, MatchPhase, MatchState};
use crate::network::broadcast::{BroadcastReport, EventBroadcaster};
use crate::network::protocol::{
    ClientRequest, ErrorCode, GameStart, ResponsePayload, ServerError, ServerMessage,
    ServerResponse, TurnEnd,
};
use crate::network::session::SessionRegistry;

/// Authoritative game service shared by every transport handler.
#[derive(Debug, Clone)]
pub struct GameService {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<EventBroadcaster>,
}

impl GameService {
    /// Create a service with its own registry and broadcaster.
    pub fn new(rules: GameRules) -> Self {
        Self::with_parts(
            Arc::new(SessionRegistry::new(rules)),
            Arc::new(EventBroadcaster::new()),
        )
    }

    /// Create a service over existing stores.
    pub fn with_parts(registry: Arc<SessionRegistry>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Outbound channels.
    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Seat `players` and deal. Creates the session if needed.
    ///
    /// A session that has not started yet may be initialized again; it is
    /// cleared and re-dealt. Started or ended sessions are refused.
    #[instrument(skip(self))]
    pub fn initialize_session(&self, match_id: &str, players: &[UserId]) -> GameResult<SetupReport> {
        let id = parse_match_id(match_id)?;
        let created = self.registry.create(&id);
        let session = self.session(&id)?;

        let outcome = {
            let mut state = session.lock();
            match state.phase {
                MatchPhase::Playing => Err(GameError::GameAlreadyStarted),
                MatchPhase::Ended => Err(GameError::MatchEnded),
                _ => setup::setup_game(&mut state, players).map(|report| (report, state.take_events())),
            }
        };

        match outcome {
            Ok((report, events)) => {
                self.publish(&id, &report.players, events);
                Ok(report)
            }
            Err(err) => {
                if created {
                    self.registry.remove(&id);
                }
                Err(err)
            }
        }
    }

    /// Start turns. Each player is sent their own opening hand.
    ///
    /// Players whose channel fails are listed in `unreachable`; the match
    /// starts regardless.
    #[instrument(skip(self))]
    pub fn start_game(&self, match_id: &str) -> GameResult<GameStart> {
        let id = parse_match_id(match_id)?;
        let session = self.session(&id)?;

        let (first_player, openings, board, events) = {
            let mut state = session.lock();
            let first = setup::start_game(&mut state, Utc::now())?;
            let openings: Vec<(UserId, Vec<CardInstance>)> = state
                .players
                .iter()
                .map(|p| (p.user_id(), p.hand()))
                .collect();
            (first, openings, state.board.snapshot(), state.take_events())
        };

        let roster: Vec<UserId> = openings.iter().map(|(user, _)| *user).collect();
        let mut unreachable = Vec::new();
        for (user, hand) in openings {
            let message = ServerMessage::Event {
                match_id: id.clone(),
                event: GameEvent::GameStarted {
                    first_player,
                    hand,
                    board: board.clone(),
                },
            };
            if let Err(err) = self.broadcaster.notify_one(user, &message) {
                warn!(%match_id, %user, error = %err, "opening hand not delivered");
                unreachable.push(user);
            }
        }
        self.publish(&id, &roster, events);

        Ok(GameStart {
            first_player,
            unreachable,
        })
    }

    // =========================================================================
    // PLAYER ACTIONS
    // =========================================================================

    /// Draw a card.
    #[instrument(skip(self))]
    pub fn draw_card(&self, match_id: &str, user: UserId, pile_index: usize) -> GameResult<DrawOutcome> {
        self.apply(match_id, |state| actions::draw_card(state, user, pile_index))
            .map(|(outcome, _)| outcome)
    }

    /// Play a head card as a new dino.
    #[instrument(skip(self))]
    pub fn play_dino_head(&self, match_id: &str, user: UserId, card_id: CardId) -> GameResult<DinoInstance> {
        self.apply(match_id, |state| actions::play_dino_head(state, user, card_id))
            .map(|(dino, _)| dino)
    }

    /// Attach a body part to one of the player's dinos.
    #[instrument(skip(self))]
    pub fn attach_body_part(
        &self,
        match_id: &str,
        user: UserId,
        body_card_id: CardId,
        head_card_id: CardId,
    ) -> GameResult<DinoInstance> {
        self.apply(match_id, |state| {
            actions::attach_body_part(state, user, body_card_id, head_card_id)
        })
        .map(|(dino, _)| dino)
    }

    /// Provoke an elemental army.
    #[instrument(skip(self))]
    pub fn provoke_army(&self, match_id: &str, user: UserId, element: Element) -> GameResult<BattleResult> {
        self.apply(match_id, |state| battle::provoke(state, user, element))
            .map(|(result, _)| result)
    }

    /// End the caller's turn.
    #[instrument(skip(self))]
    pub fn end_turn(&self, match_id: &str, user: UserId) -> GameResult<TurnEnd> {
        let (next, game_over) = self.apply(match_id, |state| actions::end_turn(state, user))?;
        Ok(TurnEnd {
            next_turn_owner: if game_over.is_some() { None } else { Some(next) },
            game_over,
        })
    }

    /// Remove a player from a match.
    ///
    /// Their channel is closed unless they are still seated in another
    /// match. Returns the final summary if too few players remain.
    #[instrument(skip(self))]
    pub fn expel_player(&self, match_id: &str, user: UserId, reason: &str) -> GameResult<Option<GameSummary>> {
        let (_, summary) = self.apply(match_id, |state| actions::expel_player(state, user, reason))?;

        // The expelled player is no longer on the roster the event went to.
        if let Ok(id) = parse_match_id(match_id) {
            let message = ServerMessage::Event {
                match_id: id,
                event: GameEvent::PlayerExpelled {
                    user_id: user,
                    reason: reason.to_string(),
                },
            };
            if let Err(err) = self.broadcaster.notify_one(user, &message) {
                debug!(%match_id, %user, error = %err, "expulsion notice not delivered");
            }
        }
        if !self.is_seated_anywhere(user) {
            self.broadcaster.unregister(user);
        }

        Ok(summary)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Public snapshot of a match.
    #[instrument(skip(self))]
    pub fn get_game_state(&self, match_id: &str) -> GameResult<GameStateSnapshot> {
        let session = self.session(&parse_match_id(match_id)?)?;
        let state = session.lock();
        Ok(state.snapshot(Utc::now()))
    }

    /// A player's hand.
    #[instrument(skip(self))]
    pub fn get_player_hand(&self, match_id: &str, user: UserId) -> GameResult<Vec<CardInstance>> {
        let session = self.session(&parse_match_id(match_id)?)?;
        let state = session.lock();
        let player = state.player(user).ok_or(GameError::PlayerNotFound(user))?;
        Ok(player.hand())
    }

    /// The arch armies.
    #[instrument(skip(self))]
    pub fn get_central_board(&self, match_id: &str) -> GameResult<BoardSnapshot> {
        let session = self.session(&parse_match_id(match_id)?)?;
        let state = session.lock();
        Ok(state.board.snapshot())
    }

    // =========================================================================
    // END OF MATCH
    // =========================================================================

    /// End the match now if an end condition holds.
    pub fn poll_match_end(&self, match_id: &str) -> GameResult<Option<GameSummary>> {
        self.poll_match_end_at(match_id, Utc::now())
    }

    /// [`poll_match_end`](Self::poll_match_end) evaluated at `now`.
    #[instrument(skip(self))]
    pub fn poll_match_end_at(&self, match_id: &str, now: DateTime<Utc>) -> GameResult<Option<GameSummary>> {
        let id = parse_match_id(match_id)?;
        let session = self.session(&id)?;
        Ok(self.conclude(&session, now))
    }

    /// End every match whose end condition holds.
    pub fn sweep_expired(&self) -> Vec<GameSummary> {
        self.sweep_expired_at(Utc::now())
    }

    /// [`sweep_expired`](Self::sweep_expired) evaluated at `now`.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> Vec<GameSummary> {
        let summaries: Vec<GameSummary> = self
            .registry
            .all_sessions()
            .iter()
            .filter_map(|session| self.conclude(session, now))
            .collect();
        if !summaries.is_empty() {
            info!(ended = summaries.len(), "swept finished matches");
        }
        summaries
    }

    /// Tell every connected player the server is going away.
    pub fn shutdown(&self, reason: &str) -> BroadcastReport {
        info!(reason, "broadcasting shutdown");
        self.broadcaster.notify_all(&ServerMessage::Shutdown {
            reason: reason.to_string(),
        })
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Execute a wire request.
    pub fn handle(&self, request: ClientRequest) -> ServerResponse {
        match request {
            ClientRequest::InitializeSession { match_id, players } => ServerResponse::from_result(
                self.initialize_session(&match_id, &players),
                ResponsePayload::SessionInitialized,
            ),
            ClientRequest::StartGame { match_id } => {
                ServerResponse::from_result(self.start_game(&match_id), ResponsePayload::GameStarted)
            }
            ClientRequest::DrawCard {
                match_id,
                user_id,
                pile_index,
            } => ServerResponse::from_result(
                self.draw_card(&match_id, user_id, pile_index),
                ResponsePayload::CardDrawn,
            ),
            ClientRequest::PlayDinoHead {
                match_id,
                user_id,
                card_id,
            } => ServerResponse::from_result(
                self.play_dino_head(&match_id, user_id, card_id),
                ResponsePayload::DinoPlayed,
            ),
            ClientRequest::AttachBodyPart {
                match_id,
                user_id,
                body_card_id,
                head_card_id,
            } => ServerResponse::from_result(
                self.attach_body_part(&match_id, user_id, body_card_id, head_card_id),
                ResponsePayload::BodyPartAttached,
            ),
            ClientRequest::ProvokeArmy {
                match_id,
                user_id,
                element,
            } => match element.parse::<Element>() {
                Ok(element) => ServerResponse::from_result(
                    self.provoke_army(&match_id, user_id, element),
                    ResponsePayload::ArmyProvoked,
                ),
                Err(err) => invalid_input(err.to_string()),
            },
            ClientRequest::EndTurn { match_id, user_id } => ServerResponse::from_result(
                self.end_turn(&match_id, user_id),
                ResponsePayload::TurnEnded,
            ),
            ClientRequest::GetGameState { match_id } => {
                ServerResponse::from_result(self.get_game_state(&match_id), ResponsePayload::GameState)
            }
            ClientRequest::GetPlayerHand { match_id, user_id } => ServerResponse::from_result(
                self.get_player_hand(&match_id, user_id),
                ResponsePayload::PlayerHand,
            ),
            ClientRequest::GetCentralBoard { match_id } => ServerResponse::from_result(
                self.get_central_board(&match_id),
                ResponsePayload::CentralBoard,
            ),
        }
    }

    /// Execute a JSON-encoded request.
    pub fn handle_json(&self, raw: &str) -> ServerResponse {
        match ClientRequest::from_json(raw) {
            Ok(request) => self.handle(request),
            Err(err) => {
                debug!(error = %err, "malformed request");
                invalid_input(err.to_string())
            }
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn session(&self, match_id: &MatchId) -> GameResult<Arc<GameSession>> {
        self.registry.get(match_id).ok_or(GameError::SessionNotFound)
    }

    fn is_seated_anywhere(&self, user: UserId) -> bool {
        self.registry
            .all_sessions()
            .iter()
            .any(|session| session.lock().player(user).is_some())
    }

    /// Run one mutating operation, then publish and check for the end.
    ///
    /// A match whose end condition already holds is ended first and the
    /// operation is refused with [`GameError::MatchEnded`].
    fn apply<T>(
        &self,
        match_id: &str,
        op: impl FnOnce(&mut MatchState) -> GameResult<T>,
    ) -> GameResult<(T, Option<GameSummary>)> {
        let id = parse_match_id(match_id)?;
        let session = self.session(&id)?;

        let (result, summary, roster, events) = {
            let mut state = session.lock();
            let (result, summary) = match end::end_game(&mut state, Utc::now()) {
                Some(summary) => (Err(GameError::MatchEnded), Some(summary)),
                None => {
                    let result = op(&mut *state);
                    let summary = match result {
                        Ok(_) => end::end_game(&mut state, Utc::now()),
                        Err(_) => None,
                    };
                    (result, summary)
                }
            };
            (result, summary, state.player_ids(), state.take_events())
        };

        self.publish(&id, &roster, events);
        if summary.is_some() {
            self.registry.remove(&id);
        }
        result.map(|value| (value, summary))
    }

    fn conclude(&self, session: &GameSession, now: DateTime<Utc>) -> Option<GameSummary> {
        let (summary, roster, events) = {
            let mut state = session.lock();
            let summary = end::end_game(&mut state, now);
            (summary, state.player_ids(), state.take_events())
        };
        self.publish(session.match_id(), &roster, events);
        if summary.is_some() {
            self.registry.remove(session.match_id());
        }
        summary
    }

    fn publish(&self, match_id: &MatchId, recipients: &[UserId], events: Vec<GameEvent>) {
        for event in events {
            debug!(%match_id, kind = event.kind(), "publishing event");
            let message = ServerMessage::Event {
                match_id: match_id.clone(),
                event,
            };
            self.broadcaster.notify_players(recipients, &message);
        }
    }
}

fn parse_match_id(raw: &str) -> GameResult<MatchId> {
    MatchId::parse(raw).ok_or(GameError::InvalidMatchId)
}

fn invalid_input(message: String) -> ServerResponse {
    ServerResponse::Error(ServerError {
        code: ErrorCode::InvalidInput,
        message,
    })
}

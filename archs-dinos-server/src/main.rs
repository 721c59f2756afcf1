//! Archs vs Dinos Game Server
//!
//! Runs a self-playing demo match through the game service, with each
//! player's notifications consumed by its own task.

use anyhow::{bail, Context};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use archs_dinos::{
    game::{events::GameEvent, Element, Role},
    network::ServerMessage,
    GameRules, GameService, MatchId, UserId, VERSION,
};

/// Safety stop for the demo loop.
const MAX_DEMO_TURNS: u32 = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let rules = GameRules::from_env();
    info!("Archs vs Dinos Server v{}", VERSION);
    info!(
        hand_size = rules.hand_size,
        action_budget = rules.action_budget,
        max_plays = rules.max_plays_per_turn,
        duration_secs = rules.match_duration_secs,
        "Rules loaded"
    );

    let service = GameService::new(rules);
    demo_match(&service).await
}

/// Log the notifications a player receives.
fn spawn_listener(user: UserId, mut rx: mpsc::Receiver<ServerMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                ServerMessage::Event {
                    event: GameEvent::GameEnded { summary },
                    ..
                } if summary.winner == Some(user) => {
                    info!("=== Match Results ===");
                    for standing in &summary.standings {
                        info!("Player {} - Score: {}", standing.user_id, standing.score);
                    }
                    info!(reason = ?summary.reason, turns = summary.turns_played, "Match over");
                }
                ServerMessage::Event { event, .. } => {
                    debug!(%user, kind = event.kind(), "Event received");
                }
                ServerMessage::Shutdown { reason } => {
                    info!(%user, %reason, "Server shutting down");
                    break;
                }
            }
        }
    })
}

/// Demo function: two players take turns until the match ends.
async fn demo_match(service: &GameService) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let match_id = MatchId::generate();
    let players = [UserId::new(1), UserId::new(2)];
    let mut listeners = Vec::new();
    for &user in &players {
        let (tx, rx) = mpsc::channel(1024);
        service.broadcaster().register_channel(user, tx);
        listeners.push(spawn_listener(user, rx));
    }

    let report = service
        .initialize_session(match_id.as_str(), &players)
        .context("Failed to initialize session")?;
    info!(
        %match_id,
        arches = report.arches_on_board,
        deck = report.deck_size,
        "Session initialized"
    );

    let start = service.start_game(match_id.as_str())?;
    info!(first = %start.first_player, "Match started");

    let mut owner = start.first_player;
    for _ in 0..MAX_DEMO_TURNS {
        match play_turn(service, &match_id, owner)? {
            Some(next) => owner = next,
            None => break,
        }
    }

    let report = service.shutdown("demo finished");
    debug!(delivered = report.delivered, "Shutdown broadcast");
    for listener in listeners {
        listener.await.context("Listener task failed")?;
    }
    Ok(())
}

/// One turn of a simple strategy: provoke a beatable army, otherwise build
/// dinos and draw with the remaining budget.
///
/// Returns the next turn owner, or `None` once the match is over.
fn play_turn(service: &GameService, match_id: &MatchId, user: UserId) -> anyhow::Result<Option<UserId>> {
    let id = match_id.as_str();
    let state = service.get_game_state(id)?;
    let Some(me) = state.players.iter().find(|p| p.user_id == user) else {
        bail!("{user} is not seated in {match_id}");
    };

    for element in Element::ALL {
        let army = state.board.army(element);
        let army_power: u32 = army.iter().map(|c| u32::from(c.power)).sum();
        let my_power: u32 = me
            .dinos
            .iter()
            .filter(|d| d.element == element)
            .map(|d| d.total_power())
            .sum();
        if !army.is_empty() && my_power >= army_power {
            let result = service.provoke_army(id, user, element)?;
            info!(%user, %element, points = result.points_awarded, "Provoked army");
            return end_turn(service, id, user);
        }
    }

    let mut heads: Vec<_> = me.dinos.iter().map(|d| d.head.id).collect();
    for card in service.get_player_hand(id, user)? {
        match card.role {
            Role::DinoHead => {
                if service.play_dino_head(id, user, card.id).is_ok() {
                    heads.push(card.id);
                }
            }
            Role::BodyPart(_) => {
                for &head in &heads {
                    if service.attach_body_part(id, user, card.id, head).is_ok() {
                        break;
                    }
                }
            }
            Role::Arch => {}
        }
    }

    while service.draw_card(id, user, 0).is_ok() {}
    if !service.registry().exists(match_id) {
        // The last draw emptied the deck.
        return Ok(None);
    }
    end_turn(service, id, user)
}

fn end_turn(service: &GameService, match_id: &str, user: UserId) -> anyhow::Result<Option<UserId>> {
    let turn = service.end_turn(match_id, user)?;
    Ok(turn.next_turn_owner)
}

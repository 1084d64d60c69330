//! Automated player driver
//!
//! An agent wakes on a fixed schedule. When it is its slot's turn it snapshots the
//! session, searches for the best placement of the active piece and replays the plan
//! as individual session calls.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use duo_tetris_core::SharedSession;
use duo_tetris_types::Player;

use crate::place::{execute_plan, plan_moves};
use crate::search::{find_best_move, MoveCandidate};

/// Agent timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    /// Wait before the first firing
    pub initial_delay: Duration,
    /// Time between firings
    pub period: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            period: Duration::from_millis(300),
        }
    }
}

/// One agent firing; returns the placement it executed, if any.
///
/// Does nothing unless the session is running, it is `player`'s turn, and the active
/// piece can still fall (a landed piece is left for the next gravity tick to lock).
pub fn agent_step(player: Player, session: &SharedSession) -> Option<MoveCandidate> {
    let snapshot = session.snapshot();
    if !snapshot.playable() || snapshot.current_player != player {
        return None;
    }
    let active = snapshot.active.as_ref()?;
    if !snapshot
        .board
        .can_place(&active.shape, active.row + 1, active.col)
    {
        return None;
    }

    let best = find_best_move(&snapshot.board, &active.shape)?;
    let plan = plan_moves(active.col, &best);
    tracing::debug!(
        player = player.number(),
        kind = active.kind,
        rotation = best.rotation,
        col = best.col,
        score = best.score,
        "agent move"
    );
    execute_plan(session, player, snapshot.episode_id, &plan).ok()?;
    Some(best)
}

/// Run the agent for `player` until `shutdown` flips to true or its sender is dropped
pub async fn run_agent(
    player: Player,
    session: SharedSession,
    config: AgentConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(player = player.number(), "agent started");

    let mut interval = time::interval_at(Instant::now() + config.initial_delay, config.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = interval.tick() => {
                agent_step(player, &session);
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!(player = player.number(), "agent stopped");
}

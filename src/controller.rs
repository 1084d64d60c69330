//! Session controller: tick scheduler and driver lifecycle.
//!
//! The controller owns the shared session plus every task that drives it: the gravity
//! tick loop, one agent per AI slot and the remote control listener when a slot is
//! EXTERNAL. All tasks watch one shutdown channel; stopping signals it and joins them.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::adapter::runtime::stop_requested;
use crate::adapter::{run_server, ServerConfig};
use crate::core::{GameState, PlayerScore, SharedSession, TickOutcome};
use crate::engine::{run_agent, AgentConfig};
use crate::types::{Player, PlayerType, SessionConfig, SessionStatus};

/// Driver settings that are not part of the game rules
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub agent: AgentConfig,
    pub server: ServerConfig,
    /// Start the listener when a slot is EXTERNAL
    pub remote_enabled: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            server: ServerConfig::default(),
            remote_enabled: true,
        }
    }
}

/// Final scores reported when the controller stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub scores: [PlayerScore; 2],
    pub status: SessionStatus,
}

impl GameSummary {
    fn from_state(game: &GameState) -> Self {
        Self {
            scores: [game.score(Player::One), game.score(Player::Two)],
            status: game.status(),
        }
    }

    pub fn score(&self, player: Player) -> PlayerScore {
        self.scores[player.index()]
    }

    /// Higher score wins; `None` on a tie
    pub fn winner(&self) -> Option<Player> {
        let one = self.score(Player::One).score;
        let two = self.score(Player::Two).score;
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => Some(Player::One),
            std::cmp::Ordering::Less => Some(Player::Two),
            std::cmp::Ordering::Equal => None,
        }
    }
}

pub struct Controller {
    config: SessionConfig,
    options: ControllerOptions,
    session: SharedSession,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    remote_ready: Option<oneshot::Receiver<SocketAddr>>,
}

impl Controller {
    /// Validate `config`, create the session and spawn its drivers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(config: SessionConfig, options: ControllerOptions) -> anyhow::Result<Self> {
        config.validate().context("invalid session configuration")?;
        let session = SharedSession::new(GameState::new(config.clone()));
        let (shutdown_tx, _) = watch::channel(false);

        let mut controller = Self {
            config,
            options,
            session,
            shutdown_tx,
            tasks: Vec::new(),
            remote_ready: None,
        };
        controller.spawn_drivers();
        Ok(controller)
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Address the remote listener bound to, once it is listening.
    ///
    /// `None` when no listener was started for this session or binding failed.
    pub async fn remote_addr(&mut self) -> Option<SocketAddr> {
        self.remote_ready.take()?.await.ok()
    }

    /// Stop every driver, reset the session with `config` and start fresh drivers.
    ///
    /// The remote client (if any) is disconnected and its queued commands discarded.
    pub async fn restart(&mut self, config: SessionConfig) -> anyhow::Result<()> {
        config.validate().context("invalid session configuration")?;
        self.stop_drivers().await;
        self.session.reset_with(config.clone());
        self.config = config;
        self.spawn_drivers();
        tracing::info!(
            episode = self.session.episode_id(),
            "new game started"
        );
        Ok(())
    }

    /// Stop all drivers and report the final scores.
    ///
    /// A game still in progress is forfeited.
    pub async fn shutdown(mut self) -> GameSummary {
        self.stop_drivers().await;
        if self.session.forfeit() {
            tracing::info!("game abandoned before it ended");
        }

        let summary = self.session.read(GameSummary::from_state);
        let one = summary.score(Player::One);
        let two = summary.score(Player::Two);
        match summary.winner() {
            Some(winner) => tracing::info!(
                winner = winner.number(),
                player1_score = one.score,
                player1_lines = one.lines,
                player2_score = two.score,
                player2_lines = two.lines,
                "final result"
            ),
            None => tracing::info!(
                score = one.score,
                player1_lines = one.lines,
                player2_lines = two.lines,
                "final result: tie"
            ),
        }
        summary
    }

    fn spawn_drivers(&mut self) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = shutdown_tx;

        self.tasks.push((
            "ticker",
            tokio::spawn(run_ticker(
                self.session.clone(),
                self.config.tick_interval(),
                shutdown_rx.clone(),
            )),
        ));

        for player in Player::BOTH {
            if self.config.player_type(player) == PlayerType::Ai {
                self.tasks.push((
                    "agent",
                    tokio::spawn(run_agent(
                        player,
                        self.session.clone(),
                        self.options.agent,
                        shutdown_rx.clone(),
                    )),
                ));
            }
        }

        let external = Player::BOTH
            .iter()
            .any(|&p| self.config.player_type(p) == PlayerType::External);
        if external && self.options.remote_enabled {
            let (ready_tx, ready_rx) = oneshot::channel();
            self.remote_ready = Some(ready_rx);
            let server = run_server(
                self.options.server.clone(),
                self.session.clone(),
                shutdown_rx,
                Some(ready_tx),
            );
            self.tasks.push((
                "remote",
                tokio::spawn(async move {
                    if let Err(e) = server.await {
                        tracing::error!(error = %format!("{e:#}"), "remote control unavailable");
                    }
                }),
            ));
        } else {
            self.remote_ready = None;
        }
    }

    async fn stop_drivers(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for (name, task) in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(task = name, error = %e, "driver task failed");
            }
        }
    }
}

/// Gravity loop: one `tick()` per level interval until shutdown
pub async fn run_ticker(
    session: SharedSession,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown) => break,
            _ = interval.tick() => {
                if let TickOutcome::Locked(event) = session.tick() {
                    tracing::debug!(
                        player = event.player.number(),
                        kind = event.kind,
                        power_up = event.power_up.map(|p| p.as_str()),
                        lines = event.lines_cleared,
                        points = event.points,
                        "piece locked"
                    );
                    if event.game_over {
                        tracing::info!(episode = session.episode_id(), "game over");
                    }
                }
            }
        }
    }
}

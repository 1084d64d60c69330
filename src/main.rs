//! Two-player runner (default binary).
//!
//! Starts the controller for one session and, when a slot is HUMAN, reads the keyboard
//! in raw mode. Without a human slot the process runs until Ctrl-C.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::terminal;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

use duo_tetris::adapter::{check_tcp_listen_available, ServerConfig};
use duo_tetris::engine::AgentConfig;
use duo_tetris::input::{KeyAction, KeyRouter};
use duo_tetris::types::{Player, PlayerType, SessionConfig, SessionStatus};
use duo_tetris::{Controller, ControllerOptions};

const KEY_POLL: Duration = Duration::from_millis(100);

fn parse_player_type(s: &str) -> Result<PlayerType, String> {
    PlayerType::from_str(s).ok_or_else(|| format!("expected human, ai or external, got {s:?}"))
}

fn parse_player(s: &str) -> Result<Player, String> {
    s.trim()
        .parse::<u8>()
        .ok()
        .and_then(Player::from_number)
        .ok_or_else(|| format!("expected 1 or 2, got {s:?}"))
}

#[derive(Debug, Parser)]
#[command(name = "duo-tetris", version, about = "Two-player falling-block puzzle")]
struct Cli {
    #[arg(short = 'v', long, action = clap::ArgAction::Count, help = "Increase verbosity level (default WARN, -v = INFO, -vv = DEBUG, -vvv = TRACE)")]
    verbose: u8,

    #[arg(long, help = "JSON session configuration; flags below override it")]
    config: Option<PathBuf>,

    #[arg(long, help = "Board width in cells (5-20)")]
    width: Option<u8>,

    #[arg(long, help = "Board height in cells (10-30)")]
    height: Option<u8>,

    #[arg(long, help = "Starting level (1-10)")]
    level: Option<u32>,

    #[arg(long, value_parser = parse_player_type, help = "Player 1 driver: human, ai or external")]
    player1: Option<PlayerType>,

    #[arg(long, value_parser = parse_player_type, help = "Player 2 driver: human, ai or external")]
    player2: Option<PlayerType>,

    #[arg(long, value_parser = parse_player, help = "Player under keyboard control at start (1 or 2)")]
    controlled: Option<Player>,

    #[arg(long, help = "Enable special pieces and power-ups")]
    extended: bool,

    #[arg(long, help = "Remote control port (overrides TETRIS_REMOTE_PORT)")]
    port: Option<u16>,
}

impl Cli {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => SessionConfig::default(),
        };

        if let Some(width) = self.width {
            config.field_width = width;
        }
        if let Some(height) = self.height {
            config.field_height = height;
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(kind) = self.player1 {
            config.player1 = kind;
        }
        if let Some(kind) = self.player2 {
            config.player2 = kind;
        }
        if let Some(player) = self.controlled {
            config.controlled_player = player;
        }
        if self.extended {
            config.extended_mode = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();

    let config = cli.session_config()?;
    info!(
        width = config.field_width,
        height = config.field_height,
        level = config.level,
        player1 = %config.player1,
        player2 = %config.player2,
        extended = config.extended_mode,
        "starting session"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(&cli, config))
}

async fn run(cli: &Cli, config: SessionConfig) -> Result<()> {
    let mut server = ServerConfig::from_env();
    if let Some(port) = cli.port {
        server.port = port;
    }

    let external = Player::BOTH
        .iter()
        .any(|&p| config.player_type(p) == PlayerType::External);
    let mut remote_enabled = !ServerConfig::is_disabled();
    if external && remote_enabled {
        if let Err(e) = check_tcp_listen_available(&server.host, server.port) {
            tracing::error!(
                host = %server.host,
                port = server.port,
                error = %e,
                "remote control port unavailable; EXTERNAL slots will stay idle"
            );
            remote_enabled = false;
        }
    }

    let options = ControllerOptions {
        agent: AgentConfig::default(),
        server,
        remote_enabled,
    };
    let mut controller = Controller::start(config.clone(), options)?;
    let mut router = KeyRouter::new(&config);

    if router.has_human() {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        let result = drive_keyboard(&mut controller, &mut router).await;
        // Always try to restore terminal state.
        let _ = terminal::disable_raw_mode();
        result?;
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
    }

    controller.shutdown().await;
    Ok(())
}

/// Forward key presses to the session until a quit key
async fn drive_keyboard(controller: &mut Controller, router: &mut KeyRouter) -> Result<()> {
    let (key_tx, mut key_rx) = mpsc::unbounded_channel::<KeyEvent>();
    let reader = tokio::task::spawn_blocking(move || read_keys(key_tx));

    while let Some(key) = key_rx.recv().await {
        match router.route(key) {
            Some(KeyAction::Quit) => break,
            Some(KeyAction::Command(command)) => {
                let applied = controller.session().apply(command);
                tracing::debug!(command = command.as_str(), applied, "key command");
            }
            Some(KeyAction::SwitchedTo(player)) => {
                info!(player = player.number(), "keyboard control switched");
            }
            Some(KeyAction::NewGame) => {
                if controller.session().status() == SessionStatus::Over {
                    let config = controller.config().clone();
                    controller.restart(config).await?;
                }
            }
            None => {}
        }
    }

    drop(key_rx);
    reader.await.context("keyboard reader panicked")??;
    Ok(())
}

/// Blocking key reader; stops when the receiving side is gone
fn read_keys(tx: mpsc::UnboundedSender<KeyEvent>) -> Result<()> {
    while !tx.is_closed() {
        if !event::poll(KEY_POLL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && tx.send(key).is_err() {
                break;
            }
        }
    }
    Ok(())
}

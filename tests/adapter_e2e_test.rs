use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use duo_tetris::adapter::{run_server, ServerConfig, BANNER};
use duo_tetris::core::{GameState, Piece, SharedSession};
use duo_tetris::types::SessionConfig;

type ClientLines = Lines<BufReader<OwnedReadHalf>>;

struct Harness {
    session: SharedSession,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<anyhow::Result<()>>,
    addr: SocketAddr,
}

async fn start_server() -> Harness {
    let session = SharedSession::new(GameState::with_seed(SessionConfig::default(), 11));
    // O piece at its spawn anchor (col 4)
    session.with(|game| game.set_active(Piece::new(2, 10).unwrap()));

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (ready_tx, ready_rx) = oneshot::channel();
    let server = tokio::spawn(run_server(
        config,
        session.clone(),
        shutdown_rx,
        Some(ready_tx),
    ));

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    Harness {
        session,
        shutdown_tx,
        server,
        addr,
    }
}

async fn next_line(lines: &mut ClientLines) -> String {
    tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timed out waiting for a line")
        .expect("read failed")
        .expect("connection closed")
}

async fn connect(addr: SocketAddr) -> (ClientLines, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    for expected in BANNER {
        assert_eq!(next_line(&mut lines).await, expected);
    }
    (lines, write_half)
}

#[tokio::test]
async fn adapter_banner_commands_and_replies() {
    let harness = start_server().await;
    let (mut lines, mut write_half) = connect(harness.addr).await;

    // Lower case, padding and blank lines are accepted
    write_half
        .write_all(b"  left \n\nup\nGET_CURRENT_PIECE\n")
        .await
        .unwrap();
    write_half.flush().await.unwrap();

    assert_eq!(next_line(&mut lines).await, "OK: Moved left");
    assert_eq!(next_line(&mut lines).await, "OK: Rotated");
    assert_eq!(next_line(&mut lines).await, "CURRENT_PIECE:");
    assert_eq!(next_line(&mut lines).await, "Type: 2");
    assert_eq!(next_line(&mut lines).await, "Row: 0");
    assert_eq!(next_line(&mut lines).await, "Col: 3");
    assert_eq!(next_line(&mut lines).await, "Is Special: false");

    write_half.write_all(b"jump\nSTATUS\n").await.unwrap();
    assert_eq!(next_line(&mut lines).await, "ERROR: Unknown command: JUMP");
    assert_eq!(next_line(&mut lines).await, "GAME_STATUS:");
    assert_eq!(next_line(&mut lines).await, "Game Over: false");
    assert_eq!(next_line(&mut lines).await, "Paused: false");
    assert_eq!(next_line(&mut lines).await, "Current Player: 1");
    assert_eq!(next_line(&mut lines).await, "Level: 1");

    write_half.write_all(b"GET_BOARD\n").await.unwrap();
    assert_eq!(next_line(&mut lines).await, "BOARD:");
    for _ in 0..20 {
        assert_eq!(next_line(&mut lines).await, "0 0 0 0 0 0 0 0 0 0");
    }

    harness.shutdown_tx.send(true).unwrap();
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn adapter_pause_silences_movement() {
    let harness = start_server().await;
    let (mut lines, mut write_half) = connect(harness.addr).await;

    write_half
        .write_all(b"PAUSE\nDROP\nGET_SCORE\n")
        .await
        .unwrap();
    assert_eq!(next_line(&mut lines).await, "OK: Pause toggled");
    // DROP while paused gets no reply at all
    assert_eq!(next_line(&mut lines).await, "SCORES:");
    assert_eq!(next_line(&mut lines).await, "Player 1 Score: 0");
    assert_eq!(next_line(&mut lines).await, "Player 1 Lines: 0");
    assert_eq!(next_line(&mut lines).await, "Player 2 Score: 0");
    assert_eq!(next_line(&mut lines).await, "Player 2 Lines: 0");
    assert_eq!(harness.session.snapshot().active.unwrap().row, 0);

    write_half.write_all(b"GET_POWERUPS\n").await.unwrap();
    assert_eq!(next_line(&mut lines).await, "POWERUPS:");
    assert_eq!(
        next_line(&mut lines).await,
        "Available: BOMB, CLEAR_ROW, CLEAR_COL, GRAVITY, FREEZE, MULTIPLIER"
    );
    assert_eq!(next_line(&mut lines).await, "Current Multiplier: 1");
    assert_eq!(next_line(&mut lines).await, "Gravity Mode: false");
    assert_eq!(next_line(&mut lines).await, "Freeze Time: 0");

    harness.shutdown_tx.send(true).unwrap();
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn adapter_reset_bumps_episode_and_next_client_is_served() {
    let harness = start_server().await;

    {
        let (mut lines, mut write_half) = connect(harness.addr).await;
        write_half.write_all(b"RESET\n").await.unwrap();
        assert_eq!(next_line(&mut lines).await, "OK: Game reset");
        assert_eq!(harness.session.episode_id(), 1);
    }

    // First client gone; the listener accepts the next one
    let (mut lines, mut write_half) = connect(harness.addr).await;
    write_half.write_all(b"STATUS\n").await.unwrap();
    assert_eq!(next_line(&mut lines).await, "GAME_STATUS:");

    harness.shutdown_tx.send(true).unwrap();
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn adapter_invalid_utf8_line_gets_error_and_keeps_connection() {
    let harness = start_server().await;
    let (mut lines, mut write_half) = connect(harness.addr).await;

    write_half.write_all(b"\xff\xfe\nSTATUS\n").await.unwrap();
    let error = next_line(&mut lines).await;
    assert!(error.starts_with("ERROR: Unknown command:"), "{error}");
    assert_eq!(next_line(&mut lines).await, "GAME_STATUS:");

    harness.shutdown_tx.send(true).unwrap();
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn adapter_pipelined_reset_keeps_following_lines() {
    let harness = start_server().await;
    let (mut lines, mut write_half) = connect(harness.addr).await;

    // Both lines are read before the reset runs
    write_half.write_all(b"RESET\nSTATUS\n").await.unwrap();
    assert_eq!(next_line(&mut lines).await, "OK: Game reset");
    assert_eq!(next_line(&mut lines).await, "GAME_STATUS:");
    assert_eq!(next_line(&mut lines).await, "Game Over: false");
    assert_eq!(harness.session.episode_id(), 1);

    harness.shutdown_tx.send(true).unwrap();
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn adapter_shutdown_closes_client() {
    let harness = start_server().await;
    let (mut lines, _write_half) = connect(harness.addr).await;

    harness.shutdown_tx.send(true).unwrap();
    let closed = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("connection was not closed");
    assert!(matches!(closed, Ok(None) | Err(_)));
    harness.server.await.unwrap().unwrap();
}

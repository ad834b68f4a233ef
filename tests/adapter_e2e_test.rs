use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use base_stack::adapter::protocol::create_hello;
use base_stack::adapter::{run_server, InboundCommand, OutboundMessage, ServerConfig, PROTOCOL_VERSION};
use base_stack::core::SessionConfig;
use base_stack::host::{LoggingHost, LoggingSubmitter};
use base_stack::App;

type Lines = tokio::io::Lines<BufReader<OwnedReadHalf>>;

async fn read_json(lines: &mut Lines) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line");
    serde_json::from_str(&line).expect("valid json")
}

/// Read until a message of `msg_type` arrives, skipping the others.
async fn read_until(lines: &mut Lines, msg_type: &str) -> serde_json::Value {
    loop {
        let v = read_json(lines).await;
        if v["type"] == msg_type {
            return v;
        }
    }
}

async fn send(writer: &mut OwnedWriteHalf, value: &serde_json::Value) {
    let mut line = serde_json::to_string(value).unwrap();
    line.push('\n');
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.flush().await.unwrap();
}

async fn connect(addr: SocketAddr) -> (Lines, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn hello(writer: &mut OwnedWriteHalf, seq: u64, name: &str, stream: bool) {
    let mut hello = create_hello(seq, name, PROTOCOL_VERSION);
    hello.requested.stream_observations = stream;
    send(writer, &serde_json::to_value(&hello).unwrap()).await;
}

fn command(seq: u64, action: &str) -> serde_json::Value {
    serde_json::json!({"type": "command", "seq": seq, "ts": 1, "action": action})
}

/// Spawn the server with the real game-loop driver behind it.
async fn start_stack(max_pending: usize) -> (SocketAddr, Vec<tokio::task::JoinHandle<()>>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_pending_commands: max_pending,
        ..ServerConfig::default()
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let engine = tokio::spawn(async move {
        let session = SessionConfig {
            seed: 5,
            selection_cooldown_ms: 0,
            animation_ms: 800,
        };
        let mut app = App::new(session, LoggingHost, LoggingSubmitter::default());
        let mut out = Vec::new();
        while let Some(inbound) = cmd_rx.recv().await {
            app.handle_inbound(inbound, &mut out);
            for msg in out.drain(..) {
                let _ = out_tx.send(msg);
            }
        }
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();
    (addr, vec![server, engine])
}

#[tokio::test]
async fn test_full_round_trip() {
    let (addr, tasks) = start_stack(64).await;
    let (mut lines, mut writer) = connect(addr).await;

    hello(&mut writer, 1, "ui", true).await;
    let welcome = read_json(&mut lines).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["game_id"], "base-stack");

    let obs = read_until(&mut lines, "observation").await;
    assert_eq!(obs["phase"], "idle");
    assert_eq!(obs["board"].as_array().unwrap().len(), 0);
    assert_eq!(obs["state_hash"].as_str().unwrap().len(), 16);

    send(&mut writer, &command(2, "start")).await;
    let ack = read_until(&mut lines, "ack").await;
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["applied"], true);

    let ready = read_until(&mut lines, "notification").await;
    assert_eq!(ready["event"], "ready");
    assert_eq!(ready["level"], 1);

    let obs = read_until(&mut lines, "observation").await;
    assert_eq!(obs["phase"], "playing");
    assert_eq!(obs["lives"], 3);
    assert_eq!(obs["timer"]["remaining_secs"], 40);
    let board = obs["board"].as_array().unwrap();
    assert_eq!(board.len(), 18);

    // Click the first free tile.
    let free_id = board
        .iter()
        .find(|t| t["free"] == true)
        .and_then(|t| t["id"].as_u64())
        .unwrap();
    send(
        &mut writer,
        &serde_json::json!({"type": "command", "seq": 3, "ts": 1, "action": "select", "tile_id": free_id}),
    )
    .await;
    let ack = read_until(&mut lines, "ack").await;
    assert_eq!(ack["seq"], 3);
    assert_eq!(ack["applied"], true);
    let obs = read_until(&mut lines, "observation").await;
    assert_eq!(obs["collection"].as_array().unwrap().len(), 1);
    assert_eq!(obs["moves"], 1);

    // Rejected intent is acked with applied=false.
    send(&mut writer, &command(4, "nextLevel")).await;
    let ack = read_until(&mut lines, "ack").await;
    assert_eq!(ack["applied"], false);

    send(&mut writer, &command(5, "freeze")).await;
    let ack = read_until(&mut lines, "ack").await;
    assert_eq!(ack["applied"], true);
    assert_eq!(ack["message"], "Time frozen!");
    let obs = read_until(&mut lines, "observation").await;
    assert_eq!(obs["freeze_used"], true);
    assert_eq!(obs["timer"]["frozen"], true);

    drop(writer);
    for t in tasks {
        t.abort();
    }
}

#[tokio::test]
async fn test_protocol_rules() {
    let (addr, tasks) = start_stack(64).await;
    let (mut lines, mut writer) = connect(addr).await;

    // Commands before hello are refused.
    send(&mut writer, &command(1, "start")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");

    hello(&mut writer, 2, "ui", false).await;
    assert_eq!(read_json(&mut lines).await["type"], "welcome");

    // seq must strictly increase.
    send(&mut writer, &command(2, "start")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 2);

    // Unknown action and missing tile id.
    send(&mut writer, &command(3, "shuffle")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    send(&mut writer, &command(4, "select")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["message"], "select requires tile_id");

    // Garbage keeps the connection alive.
    writer.write_all(b"{not json\n").await.unwrap();
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");

    // Non-streaming clients only get direct replies.
    send(&mut writer, &command(5, "start")).await;
    let ack = read_json(&mut lines).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 5);

    for t in tasks {
        t.abort();
    }
}

#[tokio::test]
async fn test_protocol_major_mismatch_closes_connection() {
    let (addr, tasks) = start_stack(64).await;
    let (mut lines, mut writer) = connect(addr).await;

    let hello = create_hello(1, "old-ui", "0.9.0");
    send(&mut writer, &serde_json::to_value(&hello).unwrap()).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "protocol_mismatch");

    let next = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for close")
        .expect("io error");
    assert!(next.is_none());

    for t in tasks {
        t.abort();
    }
}

#[tokio::test]
async fn test_observer_cannot_command_and_gets_promoted() {
    let (addr, tasks) = start_stack(64).await;

    let (mut ctrl_lines, mut ctrl) = connect(addr).await;
    hello(&mut ctrl, 1, "controller", false).await;
    assert_eq!(read_json(&mut ctrl_lines).await["role"], "controller");

    let (mut obs_lines, mut observer) = connect(addr).await;
    hello(&mut observer, 1, "observer", false).await;
    let welcome = read_json(&mut obs_lines).await;
    assert_eq!(welcome["role"], "observer");

    send(&mut observer, &command(2, "start")).await;
    let err = read_json(&mut obs_lines).await;
    assert_eq!(err["code"], "not_controller");

    // Controller leaves; the observer takes over.
    drop(ctrl);
    drop(ctrl_lines);

    let mut seq = 3;
    let mut promoted = false;
    for _ in 0..50 {
        send(&mut observer, &command(seq, "start")).await;
        let v = read_json(&mut obs_lines).await;
        seq += 1;
        if v["type"] == "ack" {
            promoted = true;
            break;
        }
        assert_eq!(v["code"], "not_controller");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(promoted, "observer was never promoted");

    for t in tasks {
        t.abort();
    }
}

#[tokio::test]
async fn test_backpressure_when_queue_is_full() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_pending_commands: 1,
        ..ServerConfig::default()
    };

    // Nobody drains the queue.
    let (cmd_tx, _cmd_rx) = mpsc::channel::<InboundCommand>(1);
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();
    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let (mut lines, mut writer) = connect(addr).await;
    hello(&mut writer, 1, "ui", false).await;
    assert_eq!(read_json(&mut lines).await["type"], "welcome");

    send(&mut writer, &command(2, "start")).await;
    send(&mut writer, &command(3, "reset")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 3);

    server.abort();
}

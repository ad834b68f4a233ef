//! TCP server for the presentation bridge
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::core::GameSnapshot;
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::GameAction;

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl std::hash::Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Major component of a `major.minor.patch` version string.
fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 16,
        }
    }
}

/// Protocol version spoken by this server.
pub const PROTOCOL_VERSION: &str = "1.0.0";

impl ServerConfig {
    /// Create from `BASE_STACK_*` environment variables.
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("BASE_STACK_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env::var("BASE_STACK_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("BASE_STACK_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    /// Check if the adapter is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("BASE_STACK_ADAPTER_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

async fn is_handshaken(state: &ServerState, client_id: usize) -> bool {
    let clients = state.clients.read().await;
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.handshaken)
        .unwrap_or(false)
}

async fn is_controller(state: &ServerState, client_id: usize) -> bool {
    *state.controller.read().await == Some(client_id)
}

async fn check_and_update_seq(state: &ServerState, client_id: usize, seq: u64) -> bool {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return true;
    };

    match client.last_seq {
        Some(prev) if seq <= prev => false,
        _ => {
            client.last_seq = Some(seq);
            true
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Ack(AckMessage),
    Error(ErrorMessage),
    Welcome(WelcomeMessage),
    Observation(ObservationMessage),
    Notification(NotificationMessage),
}

impl ClientOutbound {
    fn write_json(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        match self {
            ClientOutbound::Ack(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Error(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Welcome(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Observation(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Notification(m) => serde_json::to_writer(buf, m),
        }
    }
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up, which lets
/// callers bind to port 0.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    info!(%bound, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let clients = state.clients.read().await;
                match msg {
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Observation(obs));
                        }
                    }
                    OutboundMessage::BroadcastObservation { obs } => {
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
                        }
                    }
                    OutboundMessage::BroadcastNotification { note } => {
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                            let _ = c.tx.send(ClientOutbound::Notification(note.clone()));
                        }
                    }
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Ack(ack));
                        }
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Error(err));
                        }
                    }
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, &state, command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Remove a client and promote the lowest remaining id if it held control.
async fn release_client(state: &ServerState, client_id: usize) {
    let mut controller = state.controller.write().await;
    let mut clients = state.clients.write().await;

    let was_controller = *controller == Some(client_id);
    clients.retain(|c| c.id != client_id);

    if was_controller {
        let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
        *controller = next_id;
        match next_id {
            Some(new_id) => info!(client_id = new_id, "controller promoted"),
            None => info!(client_id, "controller released"),
        }
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: &ServerState,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if msg.write_json(&mut buf).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let result = read_loop(&mut reader, client_id, state, &command_tx, &tx).await;

    // Dropping the last senders lets the writer flush what is queued and exit.
    release_client(state, client_id).await;
    drop(tx);
    let _ = write_task.await;

    result
}

async fn read_loop(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
    client_id: usize,
    state: &ServerState,
    command_tx: &mpsc::Sender<InboundCommand>,
    tx: &mpsc::UnboundedSender<ClientOutbound>,
) -> anyhow::Result<()> {
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            // Client disconnected
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if is_handshaken(state, client_id).await
                    && !check_and_update_seq(state, client_id, hello.seq).await
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if major_version(&hello.protocol_version)
                    != major_version(&state.config.protocol_version)
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    return Ok(());
                }

                // First client to hello becomes controller.
                let role = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                    }
                    match *controller {
                        None => {
                            *controller = Some(client_id);
                            info!(client_id, name = %hello.client.name, "client is now controller");
                            AssignedRole::Controller
                        }
                        Some(id) if id == client_id => AssignedRole::Controller,
                        Some(_) => AssignedRole::Observer,
                    }
                };

                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !is_handshaken(state, client_id).await {
                    let error = create_error(
                        cmd.seq,
                        ErrorCode::HandshakeRequired,
                        "Send hello before command",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if !check_and_update_seq(state, client_id, cmd.seq).await {
                    let error = create_error(
                        cmd.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if !is_controller(state, client_id).await {
                    let error = create_error(
                        cmd.seq,
                        ErrorCode::NotController,
                        "Only controller may send commands",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                let mapped = match map_command(&cmd) {
                    Ok(c) => c,
                    Err(message) => {
                        let error = create_error(cmd.seq, ErrorCode::InvalidCommand, &message);
                        let _ = tx.send(ClientOutbound::Error(error));
                        continue;
                    }
                };
                debug!(client_id, seq = cmd.seq, ?mapped, "command queued");

                // Backpressure: bounded queue. The game loop sends the ack.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(mapped),
                    })
                    .is_err()
                {
                    let error =
                        create_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                    let _ = tx.send(ClientOutbound::Error(error));
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                let seq = unknown.seq;
                if is_handshaken(state, client_id).await
                    && !check_and_update_seq(state, client_id, seq).await
                {
                    let error = create_error(
                        seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }
                let error = create_error(seq, ErrorCode::InvalidCommand, "Unknown message type");
                let _ = tx.send(ClientOutbound::Error(error));
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                let error = create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                let _ = tx.send(ClientOutbound::Error(error));
            }
        }
    }
}

/// Map a protocol command into a game-loop command.
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, String> {
    if cmd.action.eq_ignore_ascii_case("submitScore") {
        return Ok(ClientCommand::SubmitScore);
    }
    let is_select = cmd.action.eq_ignore_ascii_case("select")
        || cmd.action.eq_ignore_ascii_case("selectTile");
    if is_select && cmd.tile_id.is_none() {
        return Err("select requires tile_id".to_string());
    }
    GameAction::from_name(&cmd.action, cmd.tile_id)
        .map(ClientCommand::Action)
        .ok_or_else(|| format!("Unknown action: {}", cmd.action))
}

/// Build observation message from a session snapshot
pub fn build_observation(snap: &GameSnapshot, seq: u64) -> ObservationMessage {
    use std::hash::{Hash, Hasher};

    let mut hasher = Fnv1aHasher::new();
    snap.hash(&mut hasher);
    let state_hash = StateHash(hasher.finish());

    observation_from_snapshot(snap, seq, state_hash)
}

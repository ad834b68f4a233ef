//! Protocol module - JSON message types for the presentation bridge
//!
//! Implements the line-delimited JSON protocol spoken between the game loop and
//! a UI host (or a bot). All messages have: type, seq (sequence number), ts
//! (timestamp in ms)

use serde::{Deserialize, Serialize};

use crate::core::{GameSnapshot, TileSnapshot};
use crate::types::{GameEvent, Phase, TileId};

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    Hello,
}

impl Default for HelloType {
    fn default() -> Self {
        Self::Hello
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "command")]
    Command,
}

impl Default for CommandType {
    fn default() -> Self {
        Self::Command
    }
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default = "default_stream_observations")]
    pub stream_observations: bool,
}

fn default_stream_observations() -> bool {
    true
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_observations: true,
        }
    }
}

/// Command message (controller only)
///
/// `action` is one of `start`, `select`, `freeze`, `hint`, `nextLevel`,
/// `retry`, `reset` or `submitScore`; `select` also needs `tile_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<TileId>,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    pub game_id: String,
}

/// Acknowledgment for an applied command.
///
/// `applied` is `false` when the game treated the command as a no-op (wrong
/// phase, covered tile, power-up already spent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLower {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "victory")]
    Victory,
    #[serde(rename = "lose_life")]
    LoseLife,
    #[serde(rename = "game_over")]
    GameOver,
}

impl From<Phase> for PhaseLower {
    fn from(value: Phase) -> Self {
        match value {
            Phase::Idle => Self::Idle,
            Phase::Playing => Self::Playing,
            Phase::Victory => Self::Victory,
            Phase::LoseLife => Self::LoseLife,
            Phase::GameOver => Self::GameOver,
        }
    }
}

/// Game state observation (sent to all streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: PhaseLower,
    pub playable: bool,
    pub episode_id: u32,
    pub seed: u32,
    pub level: u32,
    pub lives: u32,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u32>,
    pub moves: u32,
    pub timer: TimerView,
    pub freeze_used: bool,
    pub hint_used: bool,
    pub selection_locked: bool,
    pub board: Vec<TileView>,
    pub collection: Vec<TileView>,
    pub animating: Vec<TileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lose_message: Option<String>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerView {
    pub remaining_secs: u32,
    pub budget_secs: u32,
    pub running: bool,
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectView {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// One tile as the presentation layer draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub id: TileId,
    pub image: u8,
    pub url: String,
    pub x: u8,
    pub y: u8,
    pub layer: u8,
    pub rect: RectView,
    pub free: bool,
}

impl From<&TileSnapshot> for TileView {
    fn from(value: &TileSnapshot) -> Self {
        Self {
            id: value.id,
            image: value.image.0,
            url: value.image.url().to_string(),
            x: value.x,
            y: value.y,
            layer: value.layer,
            rect: RectView {
                left: value.rect.left,
                top: value.rect.top,
                width: value.rect.width,
                height: value.rect.height,
            },
            free: value.free,
        }
    }
}

/// Deterministic state hash serialized as lowercase hex (without heap allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        let s = std::str::from_utf8(&buf).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        let mut v: u64 = 0;
        for b in s.as_bytes() {
            let d = match b {
                b'0'..=b'9' => (b - b'0') as u64,
                b'a'..=b'f' => (b - b'a' + 10) as u64,
                b'A'..=b'F' => (b - b'A' + 10) as u64,
                _ => return Err(serde::de::Error::custom("invalid hex")),
            };
            v = (v << 4) | d;
        }
        Ok(StateHash(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    #[serde(rename = "notification")]
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationEvent {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "trio_cleared")]
    TrioCleared,
    #[serde(rename = "level_complete")]
    LevelComplete,
    #[serde(rename = "life_lost")]
    LifeLost,
    #[serde(rename = "game_over")]
    GameOver,
    #[serde(rename = "haptic")]
    Haptic,
}

/// Session event forwarded to streaming clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "type")]
    pub msg_type: NotificationType,
    pub seq: u64,
    pub ts: u64,
    pub event: NotificationEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lives: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type", borrow)]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if msg_type != "hello" && msg_type != "command" {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities::default(),
    }
}

/// Create a command message
pub fn create_command(seq: u64, action: &str, tile_id: Option<TileId>) -> CommandMessage {
    CommandMessage {
        msg_type: CommandType::Command,
        seq,
        ts: current_timestamp_ms(),
        action: action.to_string(),
        tile_id,
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        game_id: "base-stack".to_string(),
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, applied: bool) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        applied,
        message: None,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Build the notification for a session event.
pub fn create_notification(seq: u64, event: &GameEvent) -> NotificationMessage {
    let mut msg = NotificationMessage {
        msg_type: NotificationType::Notification,
        seq,
        ts: current_timestamp_ms(),
        event: NotificationEvent::Haptic,
        level: None,
        score: None,
        image: None,
        lives: None,
        message: None,
    };

    match *event {
        GameEvent::Ready { level } => {
            msg.event = NotificationEvent::Ready;
            msg.level = Some(level);
        }
        GameEvent::TrioCleared { image, points, .. } => {
            msg.event = NotificationEvent::TrioCleared;
            msg.image = Some(image.0);
            msg.score = Some(points);
        }
        GameEvent::LevelComplete { level, score, .. } => {
            msg.event = NotificationEvent::LevelComplete;
            msg.level = Some(level);
            msg.score = Some(score);
        }
        GameEvent::LifeLost { reason, lives_left } => {
            msg.event = NotificationEvent::LifeLost;
            msg.lives = Some(lives_left);
            msg.message = Some(reason.message().to_string());
        }
        GameEvent::GameOver { final_score } => {
            msg.event = NotificationEvent::GameOver;
            msg.score = Some(final_score);
        }
        GameEvent::Haptic => {}
    }

    msg
}

/// Build the observation body from a session snapshot.
///
/// `state_hash` is filled in by the caller.
pub(crate) fn observation_from_snapshot(
    snap: &GameSnapshot,
    seq: u64,
    state_hash: StateHash,
) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: PhaseLower::from(snap.phase),
        playable: snap.playable(),
        episode_id: snap.episode_id,
        seed: snap.seed,
        level: snap.level,
        lives: snap.lives,
        score: snap.score,
        final_score: snap.final_score,
        moves: snap.moves,
        timer: TimerView {
            remaining_secs: snap.timer.remaining_secs,
            budget_secs: snap.timer.budget_secs,
            running: snap.timer.running,
            frozen: snap.timer.frozen,
        },
        freeze_used: snap.freeze_used,
        hint_used: snap.hint_used,
        selection_locked: snap.selection_locked,
        board: snap.board.iter().map(TileView::from).collect(),
        collection: snap.collection.iter().map(TileView::from).collect(),
        animating: snap.animating.to_vec(),
        lose_message: snap.lose_message().map(str::to_string),
        state_hash,
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

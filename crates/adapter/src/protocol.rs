//! Protocol module - JSON message types for the remote control adapter
//!
//! Implements a line-delimited JSON protocol. Every message carries
//! `type`, `seq` (sender-side sequence number) and `ts` (timestamp in ms).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::BoardSnapshot;
use crate::types::{BoardEvent, Coord};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const GAME_ID: &str = "match3";

// ============== Client -> Game Messages ==============

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default)]
    pub stream_observations: bool,
}

/// Board position on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCoord {
    pub col: u8,
    pub row: u8,
}

impl From<Coord> for WireCoord {
    fn from(c: Coord) -> Self {
        Self {
            col: c.col,
            row: c.row,
        }
    }
}

impl From<WireCoord> for Coord {
    fn from(c: WireCoord) -> Self {
        Coord::new(c.col, c.row)
    }
}

/// Command message (controller only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    pub seq: u64,
    pub ts: u64,
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<WireCoord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<WireCoord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandAction {
    Swap,
    Pause,
    Resume,
    GameOver,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignedRole {
    Controller,
    Observer,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    pub game_id: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub formats: Vec<String>,
    pub commands: Vec<CommandAction>,
}

/// Acknowledgment, sent once a command has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub status: String,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub code: String,
    pub message: String,
}

/// Engine state plus everything that happened since the last observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub playable: bool,
    pub paused: bool,
    pub game_over: bool,
    pub phase: String,
    pub moves: u32,
    pub cascades: u32,
    pub seed: u32,
    pub potential: usize,
    pub hint_shown: bool,
    pub board: WireBoard,
    pub events: Vec<WireEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBoard {
    pub width: u8,
    pub height: u8,
    /// Layout-notation rows, top first
    pub rows: Vec<String>,
}

/// [`BoardEvent`] on the wire, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WireEvent {
    SwapStarted { a: WireCoord, b: WireCoord },
    SwapReverted { a: WireCoord, b: WireCoord },
    MoveAccepted,
    Exploded { cell: WireCoord, glyph: char },
    BonusCreated {
        cell: WireCoord,
        direction: String,
        sprite: u16,
    },
    Shifted { from: WireCoord, to: WireCoord },
    Spawned { cell: WireCoord, glyph: char },
    Shuffled { attempt: u32 },
    HintShown { cells: Vec<WireCoord> },
    HintCancelled { cells: Vec<WireCoord> },
    Settled { potential: usize },
}

fn wire_cells(cells: &[Coord]) -> Vec<WireCoord> {
    cells.iter().copied().map(WireCoord::from).collect()
}

impl From<&BoardEvent> for WireEvent {
    fn from(ev: &BoardEvent) -> Self {
        match ev {
            BoardEvent::SwapStarted { a, b } => WireEvent::SwapStarted {
                a: (*a).into(),
                b: (*b).into(),
            },
            BoardEvent::SwapReverted { a, b } => WireEvent::SwapReverted {
                a: (*a).into(),
                b: (*b).into(),
            },
            BoardEvent::MoveAccepted => WireEvent::MoveAccepted,
            BoardEvent::Exploded { cell, item } => WireEvent::Exploded {
                cell: (*cell).into(),
                glyph: item.glyph(),
            },
            BoardEvent::BonusCreated {
                cell,
                direction,
                sprite,
            } => WireEvent::BonusCreated {
                cell: (*cell).into(),
                direction: direction.as_str().to_string(),
                sprite: sprite.0,
            },
            BoardEvent::Shifted { from, to } => WireEvent::Shifted {
                from: (*from).into(),
                to: (*to).into(),
            },
            BoardEvent::Spawned { cell, item } => WireEvent::Spawned {
                cell: (*cell).into(),
                glyph: item.glyph(),
            },
            BoardEvent::Shuffled { attempt } => WireEvent::Shuffled { attempt: *attempt },
            BoardEvent::HintShown { cells } => WireEvent::HintShown {
                cells: wire_cells(cells),
            },
            BoardEvent::HintCancelled { cells } => WireEvent::HintCancelled {
                cells: wire_cells(cells),
            },
            BoardEvent::Settled { potential } => WireEvent::Settled {
                potential: *potential,
            },
        }
    }
}

// ============== Errors ==============

/// Protocol-level failures reported back to the sender as `error` messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("send hello before {0}")]
    HandshakeRequired(&'static str),
    #[error("protocol version {0} not supported")]
    ProtocolMismatch(String),
    #[error("only the controller may send commands")]
    NotController,
    #[error("seq must be strictly increasing")]
    SeqNotIncreasing,
    #[error("{0}")]
    InvalidCommand(String),
    #[error("swap {a} <-> {b} rejected")]
    SwapRejected { a: Coord, b: Coord },
    #[error("swap cell {0} is outside the board")]
    OutOfBounds(Coord),
    #[error("command queue is full")]
    Backpressure,
    #[error("unknown message type")]
    UnknownMessage,
}

impl ProtocolError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::HandshakeRequired(_) => "handshake_required",
            ProtocolError::ProtocolMismatch(_) => "protocol_mismatch",
            ProtocolError::NotController => "not_controller",
            ProtocolError::SeqNotIncreasing
            | ProtocolError::InvalidCommand(_)
            | ProtocolError::UnknownMessage => "invalid_command",
            ProtocolError::SwapRejected { .. } => "swap_rejected",
            ProtocolError::OutOfBounds(_) => "out_of_bounds",
            ProtocolError::Backpressure => "backpressure",
        }
    }
}

// ============== Message Parsing ==============

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown { seq: u64 },
}

/// Parse one JSON line
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
            struct Header {
                #[serde(rename = "type")]
                msg_type: Option<String>,
                seq: Option<u64>,
            }
            let header = serde_json::from_str::<Header>(json)?;
            match header.msg_type.as_deref() {
                Some("hello") | Some("command") => Err(e),
                _ => Ok(ParsedMessage::Unknown {
                    seq: header.seq.unwrap_or(0),
                }),
            }
        }
    }
}

/// Best-effort `seq` extraction from a line that is not valid JSON
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, stream_observations: bool) -> serde_json::Value {
    let hello = HelloMessage {
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        requested: RequestedCapabilities {
            stream_observations,
        },
    };
    tagged("hello", &hello)
}

/// Create a swap command
pub fn create_swap(seq: u64, a: Coord, b: Coord) -> serde_json::Value {
    let cmd = CommandMessage {
        seq,
        ts: current_timestamp_ms(),
        action: CommandAction::Swap,
        a: Some(a.into()),
        b: Some(b.into()),
    };
    tagged("command", &cmd)
}

fn tagged<T: Serialize>(msg_type: &str, msg: &T) -> serde_json::Value {
    let mut v = serde_json::to_value(msg).unwrap_or_default();
    if let Some(obj) = v.as_object_mut() {
        obj.insert("type".to_string(), msg_type.into());
    }
    v
}

/// Create a welcome message
pub fn create_welcome(seq: u64, client_id: u64, role: AssignedRole) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: "welcome".to_string(),
        seq,
        ts: current_timestamp_ms(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        client_id,
        role,
        game_id: GAME_ID.to_string(),
        capabilities: ServerCapabilities {
            formats: vec!["json".to_string()],
            commands: vec![
                CommandAction::Swap,
                CommandAction::Pause,
                CommandAction::Resume,
                CommandAction::GameOver,
            ],
        },
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: "ack".to_string(),
        seq,
        ts: current_timestamp_ms(),
        status: "ok".to_string(),
    }
}

/// Create an error message
pub fn create_error(seq: u64, err: &ProtocolError) -> ErrorMessage {
    ErrorMessage {
        msg_type: "error".to_string(),
        seq,
        ts: current_timestamp_ms(),
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

/// Build an observation from a snapshot and the events drained since the
/// previous one
pub fn build_observation(
    snapshot: &BoardSnapshot,
    events: &[BoardEvent],
    seq: u64,
) -> ObservationMessage {
    ObservationMessage {
        msg_type: "observation".to_string(),
        seq,
        ts: current_timestamp_ms(),
        playable: snapshot.playable(),
        paused: snapshot.paused,
        game_over: snapshot.game_over,
        phase: snapshot.phase.to_string(),
        moves: snapshot.moves,
        cascades: snapshot.cascades,
        seed: snapshot.seed,
        potential: snapshot.potential,
        hint_shown: snapshot.hint_shown,
        board: WireBoard {
            width: snapshot.width,
            height: snapshot.height,
            rows: snapshot.rows.clone(),
        },
        events: events.iter().map(WireEvent::from).collect(),
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

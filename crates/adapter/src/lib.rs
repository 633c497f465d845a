//! Adapter module - remote control via TCP socket with JSON protocol
//!
//! This crate lets an external agent (a bot, a test harness, a remote UI)
//! drive the engine through a TCP socket connection.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller,
//!    later clients observe; control passes on when the controller leaves
//! 4. **Observation Streaming**: Clients that asked for it receive the board
//!    and the events drained since the previous observation
//! 5. **Commanding**: The controller sends `swap`, `pause`, `resume`, `gameOver`
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: handshake with client info and requested capabilities
//! - **command**: one engine command; `swap` carries cells `a` and `b`
//!
//! ## Server → Client
//!
//! - **welcome**: response to hello with assigned role and capabilities
//! - **ack**: command applied
//! - **error**: error response with stable `code` and a message
//! - **observation**: snapshot plus events
//!
//! # Environment Variables
//!
//! - `MATCH3_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH3_AI_PORT`: Port number (default: 7777)
//! - `MATCH3_AI_MAX_PENDING`: Command queue bound (default: 10)
//! - `MATCH3_AI_DISABLED`: Set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"1.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":0,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":0,"phase":"idle","board":{...},"events":[],...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"action":"swap","a":{"col":2,"row":1},"b":{"col":2,"row":0}}
//! Server -> Client: {"type":"ack","seq":2,"ts":0,"status":"ok"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use match3_core as core;
pub use match3_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{
    apply_command, Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage,
};
pub use server::{map_command, run_server, ServerConfig};

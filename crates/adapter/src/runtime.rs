//! Adapter runtime integration.
//!
//! Bridges the synchronous engine loop with the async TCP server.

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::core::{Engine, ItemProvider};
use crate::protocol::ProtocolError;
use crate::server::{run_server, ServerConfig};
use crate::types::Coord;

/// Command delivered to the engine loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// Client asked for observations; send it the current state right away
    SnapshotRequest,
}

/// Command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    Swap { a: Coord, b: Coord },
    Pause,
    Resume,
    GameOver,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: usize, line: String },
    /// Sent to every client that requested observations
    Broadcast { line: String },
}

/// Apply a command to the engine.
///
/// Out-of-range swap cells are rejected here rather than reaching the
/// engine, which treats them as a programming error.
pub fn apply_command<P: ItemProvider>(
    engine: &mut Engine<P>,
    cmd: ClientCommand,
) -> Result<(), ProtocolError> {
    match cmd {
        ClientCommand::Swap { a, b } => {
            for c in [a, b] {
                if !engine.board().contains(c) {
                    return Err(ProtocolError::OutOfBounds(c));
                }
            }
            if engine.request_swap(a, b) {
                Ok(())
            } else {
                Err(ProtocolError::SwapRejected { a, b })
            }
        }
        ClientCommand::Pause => {
            engine.set_paused(true);
            Ok(())
        }
        ClientCommand::Resume => {
            engine.set_paused(false);
            Ok(())
        }
        ClientCommand::GameOver => {
            engine.set_game_over();
            Ok(())
        }
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `MATCH3_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        let config = ServerConfig::from_env();
        if config.disabled {
            info!("remote control disabled via MATCH3_AI_DISABLED");
            return Ok(None);
        }
        Self::start(config).map(Some)
    }

    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, None).await {
                warn!(error = %e, "adapter server stopped");
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
        })
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }
}

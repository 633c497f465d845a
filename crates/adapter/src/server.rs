//! TCP server for the remote control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_pending_commands: usize,
    pub disabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            max_pending_commands: 10,
            disabled: false,
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH3_AI_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MATCH3_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("MATCH3_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("MATCH3_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);
        let disabled = env::var("MATCH3_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            host,
            port,
            max_pending_commands,
            disabled,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid adapter address {}:{}", self.host, self.port))
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    is_controller: bool,
    stream_observations: bool,
    handshaken: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .is_some_and(|c| c.handshaken)
    }

    async fn is_controller(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .is_some_and(|c| c.is_controller)
    }

    /// Record `seq` if it is strictly greater than the last one seen
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
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
}

fn to_line<T: Serialize>(msg: &T) -> Option<String> {
    serde_json::to_string(msg).ok()
}

fn send_error(tx: &mpsc::UnboundedSender<String>, seq: u64, err: &ProtocolError) {
    debug!(seq, code = err.code(), "protocol error");
    if let Some(line) = to_line(&create_error(seq, err)) {
        let _ = tx.send(line);
    }
}

/// Start the TCP server
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let bound = listener.local_addr()?;
    info!(%bound, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new());
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let clients = state.clients.read().await;
                match msg {
                    OutboundMessage::ToClient { client_id, line } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(line);
                        }
                    }
                    OutboundMessage::Broadcast { line } => {
                        for c in clients.iter().filter(|c| c.stream_observations) {
                            let _ = c.tx.send(line.clone());
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
            if let Err(e) = handle_client(socket, client_id, state, command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        is_controller: false,
        stream_observations: false,
        handshaken: false,
        last_seq: None,
        tx: tx.clone(),
    });

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    send_error(&tx, hello.seq, &ProtocolError::SeqNotIncreasing);
                    continue;
                }

                if !hello.protocol_version.starts_with("1.") {
                    send_error(
                        &tx,
                        hello.seq,
                        &ProtocolError::ProtocolMismatch(hello.protocol_version.clone()),
                    );
                    break;
                }

                let role = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    let is_controller = controller.is_none() || *controller == Some(client_id);
                    if is_controller {
                        *controller = Some(client_id);
                    }
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.is_controller = is_controller;
                        client.stream_observations = hello.requested.stream_observations;
                    }
                    if is_controller {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    }
                };
                info!(client_id, name = %hello.client.name, ?role, "handshake complete");

                if let Some(line) = to_line(&create_welcome(hello.seq, client_id as u64, role)) {
                    let _ = tx.send(line);
                }

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    send_error(&tx, cmd.seq, &ProtocolError::HandshakeRequired("command"));
                    continue;
                }
                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    send_error(&tx, cmd.seq, &ProtocolError::SeqNotIncreasing);
                    continue;
                }
                if !state.is_controller(client_id).await {
                    send_error(&tx, cmd.seq, &ProtocolError::NotController);
                    continue;
                }

                let mapped = match map_command(&cmd) {
                    Ok(c) => c,
                    Err(e) => {
                        send_error(&tx, cmd.seq, &e);
                        continue;
                    }
                };

                // Ack is sent by the engine loop once the command is applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(mapped),
                    })
                    .is_err()
                {
                    send_error(&tx, cmd.seq, &ProtocolError::Backpressure);
                }
            }

            Ok(ParsedMessage::Unknown { seq }) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, seq).await
                {
                    send_error(&tx, seq, &ProtocolError::SeqNotIncreasing);
                    continue;
                }
                send_error(&tx, seq, &ProtocolError::UnknownMessage);
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                send_error(
                    &tx,
                    seq,
                    &ProtocolError::InvalidCommand(format!("JSON parse error: {e}")),
                );
            }
        }
    }

    // Remove the client and promote the next one (lowest id) if it held control.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            let next = clients
                .iter_mut()
                .filter(|c| c.handshaken)
                .min_by_key(|c| c.id);
            *controller = next.map(|c| {
                c.is_controller = true;
                c.id
            });
            match *controller {
                Some(id) => info!(client_id = id, "controller promoted"),
                None => info!(client_id, "controller released"),
            }
        }
    }

    drop(tx);
    let _ = write_task.await;
    Ok(())
}

/// Map a protocol command into an engine command.
pub fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, ProtocolError> {
    match cmd.action {
        CommandAction::Swap => match (cmd.a, cmd.b) {
            (Some(a), Some(b)) => Ok(ClientCommand::Swap {
                a: a.into(),
                b: b.into(),
            }),
            _ => Err(ProtocolError::InvalidCommand(
                "swap needs both a and b".to_string(),
            )),
        },
        CommandAction::Pause => Ok(ClientCommand::Pause),
        CommandAction::Resume => Ok(ClientCommand::Resume),
        CommandAction::GameOver => Ok(ClientCommand::GameOver),
    }
}

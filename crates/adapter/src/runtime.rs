//! Adapter runtime integration.
//!
//! Bridges the sync game loop with the async TCP server.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::protocol::{AckMessage, ErrorMessage, NotificationMessage, ObservationMessage};
use crate::server::{run_server, ServerConfig, ServerState};
use crate::types::GameAction;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// A client finished its handshake and wants the current state.
    SnapshotRequest,
    Command(ClientCommand),
}

/// Command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    Action(GameAction),
    /// Submit the current result to the leaderboard collaborator.
    SubmitScore,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    BroadcastObservation { obs: ObservationMessage },
    BroadcastNotification { note: NotificationMessage },
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientError { client_id: usize, err: ErrorMessage },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `BASE_STACK_ADAPTER_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if ServerState::is_disabled() {
            info!("adapter disabled via BASE_STACK_ADAPTER_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server on its own runtime and wait until it is listening.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        let server = rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await {
                warn!(error = %e, "adapter server stopped");
            }
        });

        let addr = rt.block_on(async {
            match tokio::time::timeout(Duration::from_secs(5), ready_rx).await {
                Ok(Ok(addr)) => Ok(addr),
                _ => {
                    server.abort();
                    Err(anyhow::anyhow!("adapter server failed to start"))
                }
            }
        })?;

        Ok(Self {
            _rt: rt,
            addr,
            cmd_rx,
            out_tx,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }
}

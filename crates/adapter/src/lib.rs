//! Adapter module - presentation bridge over a TCP socket with JSON protocol
//!
//! This module lets an out-of-process presentation layer (the web host, a
//! replay viewer, a bot) drive the game and render it. The game loop stays
//! synchronous; the adapter owns a tokio runtime and talks to the loop through
//! bounded channels.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Observation Streaming**: Server sends a snapshot after every state change
//! 5. **Commanding**: Controller clicks tiles and triggers power-ups
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **command**: `{"action": ..., "tile_id": ...}` where action is one of
//!   `start`, `select`, `freeze`, `hint`, `nextLevel`, `retry`, `reset`,
//!   `submitScore`
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with the assigned role
//! - **observation**: Full session snapshot (board, collection, timer, lives, ...)
//! - **notification**: Session events (ready, trio cleared, life lost, game over, ...)
//! - **ack**: Command applied (`applied: false` for a rejected no-op)
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `BASE_STACK_HOST`: Bind address (default: "127.0.0.1")
//! - `BASE_STACK_PORT`: Port number (default: 7878)
//! - `BASE_STACK_MAX_PENDING`: Command queue bound (default: 16)
//! - `BASE_STACK_ADAPTER_DISABLED`: Set to "1" or "true" to disable adapter entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1,"client":{"name":"ui","version":"1.0.0"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":2,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":2,"phase":"idle",...}
//! Client -> Server: {"type":"command","seq":2,"ts":3,"action":"start"}
//! Server -> Client: {"type":"ack","seq":2,"ts":3,"status":"ok","applied":true}
//! Client -> Server: {"type":"command","seq":3,"ts":4,"action":"select","tile_id":12}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use base_stack_core as core;
pub use base_stack_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{build_observation, run_server, ServerConfig, ServerState, PROTOCOL_VERSION};

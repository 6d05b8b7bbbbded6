//! # kanban-sync: Live board channel for kanban clients
//!
//! Keeps one websocket connection per board view and bridges it to a
//! [`kanban_core::BoardStore`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  intents   ┌──────────────────────┐  text frames  ┌────────────┐
//! │ BoardClient  │ ─────────► │ driver task          │ ◄───────────► │ board      │
//! │ (handle)     │ ◄───────── │  ConnectionController│   WebSocket   │ channel    │
//! └──────────────┘ ClientEvent│  (sans-I/O)          │               └────────────┘
//!                             └──────────┬───────────┘
//!                                        │ effects: Send / ArmTimer / Redirect
//!                                        ▼
//!                                  timers, writer task
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Connection settings
//! - [`controller`]: Frame handling, timers and redirect decisions
//! - [`client`]: tokio driver with bounded reconnection

pub mod client;
pub mod config;
pub mod controller;

pub use client::{BoardClient, ClientEvent, ConnectionState};
pub use config::{ClientConfig, ConnectionParams};
pub use controller::{ConnectionController, Effect, TimerKind};

/// Errors raised by the board channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("gave up after {attempts} connection attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("board slug or client address not known yet")]
    NotReady,
    #[error("connection closed")]
    Closed,
}

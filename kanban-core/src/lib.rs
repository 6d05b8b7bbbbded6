//! # kanban-core: Client-side model of a shared kanban board
//!
//! Everything here is synchronous and free of I/O; the transport lives in
//! `kanban-sync`.
//!
//! ## Architecture
//!
//! ```text
//!  view intent                         inbound text frame
//!      │                                      │
//!      ▼                                      ▼
//! ┌────────────┐   reduce()   ┌────────────┐  decode_frame()  ┌────────────┐
//! │ BoardEvent │ ───────────► │ BoardStore │ ◄─────────────── │  protocol  │
//! └────────────┘              └─────┬──────┘                  └────────────┘
//!                                   │ optimistic edits
//!                                   ▼
//!                             ┌────────────┐
//!                             │  ordering  │ dense index reassignment
//!                             └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Board, column, task, membership and message entities
//! - [`ordering`]: Delete and move operations keeping indices dense
//! - [`protocol`]: JSON commands out, typed broadcasts in
//! - [`form`]: The single open form of a board view
//! - [`store`]: Board state and its reducer
//! - [`trial`]: Local-only starter board

pub mod form;
pub mod model;
pub mod ordering;
pub mod protocol;
pub mod store;
pub mod trial;

pub use form::{ActiveForm, FormInput};
pub use model::{ActivityLog, Board, Column, Membership, Message, Role, Task, User};
pub use protocol::{
    decode_board, decode_frame, Broadcast, ChannelCode, Command, DecodeError, Entity,
    InboundFrame, MembersSaved, ProtocolError, WsError,
};
pub use store::{reduce, BoardEvent, BoardState, BoardStore, RedirectTarget, SyncPhase};

//! kanban-core library: the board store and its ordering engine.
//!
//! # Conventions
//!
//! - **Errors**: board operations return [`error::KanbanResult`]; setup paths
//!   (opening the store, loading config) use `anyhow::Result`.
//! - **Logging**: use `tracing` macros. `debug!` for plan details, `info!`
//!   for committed mutations, `warn!` for stale or rejected requests.
//! - **Ordering**: positions of tasks in a column and of columns in a board
//!   are always `0..n-1`. Only [`ordering`] and the insert/delete paths in
//!   [`service`] write them.

pub mod accounts;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod ordering;
pub mod service;

pub use error::{ErrorCode, KanbanError, KanbanResult};
pub use ordering::{ColumnLane, MoveRequest, TaskLane};
pub use service::Session;

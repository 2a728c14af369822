//! Board, column, task, and subtask records as read from the store.

pub mod board;
pub mod id;
pub mod task;

pub use board::{Board, BoardSummary, BoardView, Column, ColumnSpec, ColumnView, User};
pub use id::{BoardId, ColumnId, SubtaskId, TaskId, UserId};
pub use task::{Subtask, SubtaskSpec, Task, TaskPatch, TaskView};

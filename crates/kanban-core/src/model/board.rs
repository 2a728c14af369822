use serde::{Deserialize, Serialize};

use super::id::{BoardId, ColumnId, UserId};
use super::task::TaskView;

/// A registered user. Boards are owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at_us: i64,
}

/// A board row without its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub user_id: UserId,
    pub name: String,
    pub created_at_us: i64,
}

/// Board listing row with the number of columns it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub name: String,
    pub column_count: usize,
    pub created_at_us: i64,
}

/// A column: an ordered group of tasks, itself ranked among its board's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub position: i64,
}

/// A column together with its tasks in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<TaskView>,
}

/// The full board tree: columns by position, tasks by position, subtasks by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    /// Find a column in the tree by id.
    #[must_use]
    pub fn column(&self, id: ColumnId) -> Option<&ColumnView> {
        self.columns.iter().find(|view| view.column.id == id)
    }

    /// Find a column in the tree by case-insensitive name.
    #[must_use]
    pub fn column_named(&self, name: &str) -> Option<&ColumnView> {
        self.columns
            .iter()
            .find(|view| view.column.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Desired column entry when replacing a board's column list.
///
/// `id: None` creates a new column; a known id renames and repositions the
/// existing one. Existing columns absent from the list are deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default)]
    pub id: Option<ColumnId>,
    pub name: String,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn existing(id: ColumnId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::id::{ColumnId, SubtaskId, TaskId};

/// A task row. `position` is its dense rank within `column_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: String,
    pub position: i64,
    pub created_at_us: i64,
}

/// A checklist entry under a task. Subtasks carry no position and are listed
/// by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub task_id: TaskId,
    pub title: String,
    pub is_completed: bool,
}

/// A task with its subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
}

impl TaskView {
    /// Number of completed subtasks, as shown on a task card ("1 of 3").
    #[must_use]
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.is_completed).count()
    }
}

/// Desired subtask entry when creating a task or replacing its checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskSpec {
    #[serde(default)]
    pub id: Option<SubtaskId>,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl SubtaskSpec {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            is_completed: false,
        }
    }
}

/// Field edits for a task. `None` leaves the field unchanged; a `Some`
/// subtask list replaces the checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubtaskSpec>>,
}

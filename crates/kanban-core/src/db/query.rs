//! `SQLite` query helpers for the board store.
//!
//! Typed read functions for the common access patterns: ownership lookups,
//! ordered column/task listings, and the full board tree.
//!
//! All functions take a shared `&Connection` (a `Transaction` derefs to one,
//! so the same helpers run inside move and delete transactions) and return
//! typed structs, never raw rows.

use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;

use crate::model::{
    Board, BoardId, BoardSummary, BoardView, Column, ColumnId, ColumnView, Subtask, SubtaskId,
    Task, TaskId, TaskView, User, UserId,
};

// ---------------------------------------------------------------------------
// Ownership lookups
// ---------------------------------------------------------------------------

/// Where a task currently lives, and who owns the board above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLocation {
    pub task_id: TaskId,
    pub column_id: ColumnId,
    pub position: i64,
    pub board_id: BoardId,
    pub owner: UserId,
}

/// Where a column lives, and who owns its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLocation {
    pub column_id: ColumnId,
    pub board_id: BoardId,
    pub position: i64,
    pub owner: UserId,
}

/// Resolve a task to its column, board, and owner.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn task_location(conn: &Connection, task_id: TaskId) -> rusqlite::Result<Option<TaskLocation>> {
    conn.query_row(
        "SELECT t.task_id, t.column_id, t.position, c.board_id, b.user_id
         FROM tasks t
         JOIN columns c ON c.column_id = t.column_id
         JOIN boards b ON b.board_id = c.board_id
         WHERE t.task_id = ?1",
        params![task_id],
        |row| {
            Ok(TaskLocation {
                task_id: row.get(0)?,
                column_id: row.get(1)?,
                position: row.get(2)?,
                board_id: row.get(3)?,
                owner: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Resolve a column to its board and owner.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn column_location(
    conn: &Connection,
    column_id: ColumnId,
) -> rusqlite::Result<Option<ColumnLocation>> {
    conn.query_row(
        "SELECT c.column_id, c.board_id, c.position, b.user_id
         FROM columns c
         JOIN boards b ON b.board_id = c.board_id
         WHERE c.column_id = ?1",
        params![column_id],
        |row| {
            Ok(ColumnLocation {
                column_id: row.get(0)?,
                board_id: row.get(1)?,
                position: row.get(2)?,
                owner: row.get(3)?,
            })
        },
    )
    .optional()
}

/// Resolve a subtask and the owner of the board above it.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn subtask_location(
    conn: &Connection,
    subtask_id: SubtaskId,
) -> rusqlite::Result<Option<(Subtask, UserId)>> {
    conn.query_row(
        "SELECT s.subtask_id, s.task_id, s.title, s.is_completed, b.user_id
         FROM subtasks s
         JOIN tasks t ON t.task_id = s.task_id
         JOIN columns c ON c.column_id = t.column_id
         JOIN boards b ON b.board_id = c.board_id
         WHERE s.subtask_id = ?1",
        params![subtask_id],
        |row| Ok((subtask_from_row(row)?, row.get(4)?)),
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at_us: row.get(3)?,
    })
}

/// Look up a user by email (case-insensitive).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, name, email, created_at_us FROM users WHERE email = ?1",
        params![email.trim()],
        user_from_row,
    )
    .optional()
}

/// Fetch a user by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_user(conn: &Connection, user_id: UserId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, name, email, created_at_us FROM users WHERE user_id = ?1",
        params![user_id],
        user_from_row,
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Boards and columns
// ---------------------------------------------------------------------------

/// Fetch a board row.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_board(conn: &Connection, board_id: BoardId) -> rusqlite::Result<Option<Board>> {
    conn.query_row(
        "SELECT board_id, user_id, name, created_at_us FROM boards WHERE board_id = ?1",
        params![board_id],
        |row| {
            Ok(Board {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                created_at_us: row.get(3)?,
            })
        },
    )
    .optional()
}

/// List a user's boards, oldest first, with column counts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_boards(conn: &Connection, owner: UserId) -> rusqlite::Result<Vec<BoardSummary>> {
    let mut stmt = conn.prepare(
        "SELECT b.board_id, b.name, b.created_at_us,
                (SELECT COUNT(*) FROM columns c WHERE c.board_id = b.board_id)
         FROM boards b
         WHERE b.user_id = ?1
         ORDER BY b.created_at_us ASC, b.board_id ASC",
    )?;
    let rows = stmt.query_map(params![owner], |row| {
        let count: i64 = row.get(3)?;
        Ok(BoardSummary {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at_us: row.get(2)?,
            column_count: usize::try_from(count).unwrap_or_default(),
        })
    })?;
    rows.collect()
}

/// Columns of a board in position order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_columns(conn: &Connection, board_id: BoardId) -> rusqlite::Result<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT column_id, board_id, name, position
         FROM columns
         WHERE board_id = ?1
         ORDER BY position ASC, column_id ASC",
    )?;
    let rows = stmt.query_map(params![board_id], |row| {
        Ok(Column {
            id: row.get(0)?,
            board_id: row.get(1)?,
            name: row.get(2)?,
            position: row.get(3)?,
        })
    })?;
    rows.collect()
}

/// Number of columns on a board (the position a new column receives).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_columns(conn: &Connection, board_id: BoardId) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM columns WHERE board_id = ?1",
        params![board_id],
        |row| row.get(0),
    )
}

// ---------------------------------------------------------------------------
// Tasks and subtasks
// ---------------------------------------------------------------------------

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        position: row.get(4)?,
        created_at_us: row.get(5)?,
    })
}

fn subtask_from_row(row: &Row<'_>) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get(0)?,
        task_id: row.get(1)?,
        title: row.get(2)?,
        is_completed: row.get(3)?,
    })
}

/// Fetch a task row.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_task(conn: &Connection, task_id: TaskId) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        "SELECT task_id, column_id, title, description, position, created_at_us
         FROM tasks WHERE task_id = ?1",
        params![task_id],
        task_from_row,
    )
    .optional()
}

/// Tasks of a column in position order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tasks(conn: &Connection, column_id: ColumnId) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, column_id, title, description, position, created_at_us
         FROM tasks
         WHERE column_id = ?1
         ORDER BY position ASC, task_id ASC",
    )?;
    let rows = stmt.query_map(params![column_id], task_from_row)?;
    rows.collect()
}

/// Number of tasks in a column (the position a new task receives).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tasks(conn: &Connection, column_id: ColumnId) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE column_id = ?1",
        params![column_id],
        |row| row.get(0),
    )
}

/// Subtasks of a task, by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_subtasks(conn: &Connection, task_id: TaskId) -> rusqlite::Result<Vec<Subtask>> {
    let mut stmt = conn.prepare(
        "SELECT subtask_id, task_id, title, is_completed
         FROM subtasks
         WHERE task_id = ?1
         ORDER BY subtask_id ASC",
    )?;
    let rows = stmt.query_map(params![task_id], subtask_from_row)?;
    rows.collect()
}

/// A task with its subtasks.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn load_task_view(conn: &Connection, task_id: TaskId) -> rusqlite::Result<Option<TaskView>> {
    let Some(task) = get_task(conn, task_id)? else {
        return Ok(None);
    };
    let subtasks = list_subtasks(conn, task_id)?;
    Ok(Some(TaskView { task, subtasks }))
}

/// The whole board tree in three queries.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn load_board_view(conn: &Connection, board_id: BoardId) -> rusqlite::Result<Option<BoardView>> {
    let Some(board) = get_board(conn, board_id)? else {
        return Ok(None);
    };

    let mut subtasks_by_task: HashMap<TaskId, Vec<Subtask>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT s.subtask_id, s.task_id, s.title, s.is_completed
             FROM subtasks s
             JOIN tasks t ON t.task_id = s.task_id
             JOIN columns c ON c.column_id = t.column_id
             WHERE c.board_id = ?1
             ORDER BY s.subtask_id ASC",
        )?;
        for subtask in stmt.query_map(params![board_id], subtask_from_row)? {
            let subtask = subtask?;
            subtasks_by_task
                .entry(subtask.task_id)
                .or_default()
                .push(subtask);
        }
    }

    let mut tasks_by_column: HashMap<ColumnId, Vec<TaskView>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT t.task_id, t.column_id, t.title, t.description, t.position, t.created_at_us
             FROM tasks t
             JOIN columns c ON c.column_id = t.column_id
             WHERE c.board_id = ?1
             ORDER BY t.column_id ASC, t.position ASC, t.task_id ASC",
        )?;
        for task in stmt.query_map(params![board_id], task_from_row)? {
            let task = task?;
            let subtasks = subtasks_by_task.remove(&task.id).unwrap_or_default();
            tasks_by_column
                .entry(task.column_id)
                .or_default()
                .push(TaskView { task, subtasks });
        }
    }

    let columns = list_columns(conn, board_id)?
        .into_iter()
        .map(|column| {
            let tasks = tasks_by_column.remove(&column.id).unwrap_or_default();
            ColumnView { column, tasks }
        })
        .collect();

    Ok(Some(BoardView { board, columns }))
}

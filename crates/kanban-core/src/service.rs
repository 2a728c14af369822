//! Board operations scoped to one principal.
//!
//! Every mutating call runs in its own `BEGIN IMMEDIATE` transaction: the
//! ownership checks, the writes, and any position compaction commit together
//! or not at all. Reads run on the plain connection.
//!
//! Deletes never rely on foreign-key cascades. Dependents (subtasks, then
//! tasks, then columns) are removed explicitly before their parent, and the
//! surviving siblings of a deleted task or column are compacted in the same
//! transaction.

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use std::collections::HashSet;

use crate::db::{now_us, query};
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::model::{
    Board, BoardId, BoardSummary, BoardView, Column, ColumnId, ColumnSpec, Subtask, SubtaskId,
    SubtaskSpec, TaskId, TaskPatch, TaskView, UserId,
};
use crate::ordering::applier::apply_within;
use crate::ordering::compactor::close_gap;
use crate::ordering::planner::plan_move;
use crate::ordering::{ColumnLane, MoveRequest, Plan, TaskLane, snapshot};

/// A principal bound to an open store.
#[derive(Debug, Clone, Copy)]
pub struct Session<'conn> {
    conn: &'conn Connection,
    principal: UserId,
}

impl<'conn> Session<'conn> {
    #[must_use]
    pub const fn new(conn: &'conn Connection, principal: UserId) -> Self {
        Self { conn, principal }
    }

    /// Resolve `email` to a user and open a session as that user.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::UnknownUser`] if no account has that email.
    pub fn for_email(conn: &'conn Connection, email: &str) -> KanbanResult<Self> {
        let user = crate::accounts::resolve_user(conn, email)?;
        Ok(Self::new(conn, user.id))
    }

    #[must_use]
    pub const fn principal(&self) -> UserId {
        self.principal
    }

    fn begin(&self) -> KanbanResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn authorize(&self, owner: UserId) -> KanbanResult<()> {
        if owner == self.principal {
            return Ok(());
        }
        tracing::warn!(
            principal = %self.principal,
            owner = %owner,
            "rejected access to a board owned by another user"
        );
        Err(KanbanError::Unauthorized)
    }

    fn owned_board(&self, conn: &Connection, board_id: BoardId) -> KanbanResult<Board> {
        let board = query::get_board(conn, board_id)?
            .ok_or_else(|| KanbanError::not_found(Entity::Board, board_id.get()))?;
        self.authorize(board.user_id)?;
        Ok(board)
    }

    fn owned_column(
        &self,
        conn: &Connection,
        column_id: ColumnId,
    ) -> KanbanResult<query::ColumnLocation> {
        let location = query::column_location(conn, column_id)?
            .ok_or_else(|| KanbanError::not_found(Entity::Column, column_id.get()))?;
        self.authorize(location.owner)?;
        Ok(location)
    }

    fn owned_task(&self, conn: &Connection, task_id: TaskId) -> KanbanResult<query::TaskLocation> {
        let location = query::task_location(conn, task_id)?
            .ok_or_else(|| KanbanError::not_found(Entity::Task, task_id.get()))?;
        self.authorize(location.owner)?;
        Ok(location)
    }

    fn owned_subtask(&self, conn: &Connection, subtask_id: SubtaskId) -> KanbanResult<Subtask> {
        let (subtask, owner) = query::subtask_location(conn, subtask_id)?
            .ok_or_else(|| KanbanError::not_found(Entity::Subtask, subtask_id.get()))?;
        self.authorize(owner)?;
        Ok(subtask)
    }

    // -----------------------------------------------------------------------
    // Boards
    // -----------------------------------------------------------------------

    /// The principal's boards, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Storage`] if the query fails.
    pub fn list_boards(&self) -> KanbanResult<Vec<BoardSummary>> {
        Ok(query::list_boards(self.conn, self.principal)?)
    }

    /// Create a board with columns at positions `0..columns.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`] for a blank board or column name.
    pub fn create_board(&self, name: &str, columns: &[String]) -> KanbanResult<BoardView> {
        let name = required("board name", name)?;
        let columns = columns
            .iter()
            .map(|column| required("column name", column))
            .collect::<KanbanResult<Vec<_>>>()?;

        let tx = self.begin()?;
        let board_id = insert_board(&tx, self.principal, name, &columns)?;
        tx.commit()?;

        tracing::info!(board = %board_id, columns = columns.len(), "created board");
        self.get_board(board_id)
    }

    /// The full board tree.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn get_board(&self, board_id: BoardId) -> KanbanResult<BoardView> {
        self.owned_board(self.conn, board_id)?;
        query::load_board_view(self.conn, board_id)?
            .ok_or_else(|| KanbanError::not_found(Entity::Board, board_id.get()))
    }

    /// Rename a board and optionally replace its column list.
    ///
    /// With `columns`, existing columns missing from the list are deleted
    /// together with their tasks and subtasks, listed ones are renamed and
    /// moved to their list index, and entries without an id are created.
    ///
    /// # Errors
    ///
    /// - [`KanbanError::Invalid`] for a blank name or a column listed twice
    /// - [`KanbanError::NotFound`] for a listed id that is not on this board
    /// - [`KanbanError::Unauthorized`] for a foreign board
    pub fn update_board(
        &self,
        board_id: BoardId,
        name: &str,
        columns: Option<&[ColumnSpec]>,
    ) -> KanbanResult<BoardView> {
        let name = required("board name", name)?;

        let tx = self.begin()?;
        self.owned_board(&tx, board_id)?;
        tx.execute(
            "UPDATE boards SET name = ?1, updated_at_us = ?2 WHERE board_id = ?3",
            params![name, now_us(), board_id],
        )?;
        if let Some(specs) = columns {
            replace_columns(&tx, board_id, specs)?;
        }
        tx.commit()?;

        tracing::info!(board = %board_id, replaced_columns = columns.is_some(), "updated board");
        self.get_board(board_id)
    }

    /// Delete a board and everything on it.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn delete_board(&self, board_id: BoardId) -> KanbanResult<()> {
        let tx = self.begin()?;
        self.owned_board(&tx, board_id)?;

        let subtasks = tx.execute(
            "DELETE FROM subtasks WHERE task_id IN (
                 SELECT t.task_id FROM tasks t
                 JOIN columns c ON c.column_id = t.column_id
                 WHERE c.board_id = ?1
             )",
            params![board_id],
        )?;
        let tasks = tx.execute(
            "DELETE FROM tasks WHERE column_id IN (SELECT column_id FROM columns WHERE board_id = ?1)",
            params![board_id],
        )?;
        let columns = tx.execute("DELETE FROM columns WHERE board_id = ?1", params![board_id])?;
        tx.execute("DELETE FROM boards WHERE board_id = ?1", params![board_id])?;
        tx.commit()?;

        tracing::info!(board = %board_id, columns, tasks, subtasks, "deleted board");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Columns
    // -----------------------------------------------------------------------

    /// Append a column to a board.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`], [`KanbanError::NotFound`], or
    /// [`KanbanError::Unauthorized`].
    pub fn create_column(&self, board_id: BoardId, name: &str) -> KanbanResult<Column> {
        let name = required("column name", name)?;

        let tx = self.begin()?;
        self.owned_board(&tx, board_id)?;
        let position = query::count_columns(&tx, board_id)?;
        let id = insert_column(&tx, board_id, name, position, now_us())?;
        touch_board(&tx, board_id)?;
        tx.commit()?;

        tracing::info!(board = %board_id, column = %id, position, "created column");
        Ok(Column {
            id,
            board_id,
            name: name.to_string(),
            position,
        })
    }

    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`], [`KanbanError::NotFound`], or
    /// [`KanbanError::Unauthorized`].
    pub fn rename_column(&self, column_id: ColumnId, name: &str) -> KanbanResult<Column> {
        let name = required("column name", name)?;

        let tx = self.begin()?;
        let location = self.owned_column(&tx, column_id)?;
        tx.execute(
            "UPDATE columns SET name = ?1 WHERE column_id = ?2",
            params![name, column_id],
        )?;
        touch_board(&tx, location.board_id)?;
        tx.commit()?;

        Ok(Column {
            id: column_id,
            board_id: location.board_id,
            name: name.to_string(),
            position: location.position,
        })
    }

    /// Move a column to `dest_index` among its board's columns. An index past
    /// the end appends.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn move_column(&self, column_id: ColumnId, dest_index: usize) -> KanbanResult<()> {
        let tx = self.begin()?;
        let location = self.owned_column(&tx, column_id)?;

        let current = snapshot::<ColumnLane>(&tx, location.board_id)?;
        let source_index = current
            .index_of(column_id)
            .ok_or_else(|| KanbanError::not_found(Entity::Column, column_id.get()))?;
        let request = MoveRequest::<ColumnLane>::new(
            column_id,
            location.board_id,
            location.board_id,
            source_index,
            dest_index,
        );

        let plan = plan_move(&request, &current, None)?;
        apply_within(&tx, &plan)?;
        if !plan.is_noop() {
            touch_board(&tx, location.board_id)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a column with its tasks and their subtasks, then compact the
    /// board's remaining columns.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn delete_column(&self, column_id: ColumnId) -> KanbanResult<()> {
        let tx = self.begin()?;
        let location = self.owned_column(&tx, column_id)?;

        let tasks = delete_column_rows(&tx, column_id)?;
        let shifted = close_gap::<ColumnLane>(&tx, location.board_id, location.position)?;
        touch_board(&tx, location.board_id)?;
        tx.commit()?;

        tracing::info!(
            board = %location.board_id,
            column = %column_id,
            tasks,
            shifted,
            "deleted column"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Append a task to a column, with optional subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`] for a blank title or subtask title,
    /// [`KanbanError::NotFound`], or [`KanbanError::Unauthorized`].
    pub fn create_task(
        &self,
        column_id: ColumnId,
        title: &str,
        description: &str,
        subtasks: &[String],
    ) -> KanbanResult<TaskView> {
        let title = required("task title", title)?;
        let subtasks = subtasks
            .iter()
            .map(|subtask| required("subtask title", subtask))
            .collect::<KanbanResult<Vec<_>>>()?;

        let tx = self.begin()?;
        let location = self.owned_column(&tx, column_id)?;
        let position = query::count_tasks(&tx, column_id)?;
        let now = now_us();
        tx.execute(
            "INSERT INTO tasks (column_id, title, description, position, created_at_us)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![column_id, title, description.trim(), position, now],
        )?;
        let task_id = TaskId(tx.last_insert_rowid());
        for subtask in &subtasks {
            insert_subtask(&tx, task_id, subtask, false, now)?;
        }
        touch_board(&tx, location.board_id)?;
        tx.commit()?;

        tracing::info!(column = %column_id, task = %task_id, position, "created task");
        self.get_task(task_id)
    }

    /// A task with its subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn get_task(&self, task_id: TaskId) -> KanbanResult<TaskView> {
        self.owned_task(self.conn, task_id)?;
        query::load_task_view(self.conn, task_id)?
            .ok_or_else(|| KanbanError::not_found(Entity::Task, task_id.get()))
    }

    /// Edit a task's fields. A subtask list in the patch replaces the
    /// checklist: missing entries are deleted, known ids updated, new entries
    /// created.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`], [`KanbanError::NotFound`] (including
    /// a subtask id that belongs to another task), or
    /// [`KanbanError::Unauthorized`].
    pub fn update_task(&self, task_id: TaskId, patch: &TaskPatch) -> KanbanResult<TaskView> {
        let title = patch
            .title
            .as_deref()
            .map(|title| required("task title", title))
            .transpose()?;

        let tx = self.begin()?;
        let location = self.owned_task(&tx, task_id)?;
        if let Some(title) = title {
            tx.execute(
                "UPDATE tasks SET title = ?1 WHERE task_id = ?2",
                params![title, task_id],
            )?;
        }
        if let Some(description) = patch.description.as_deref() {
            tx.execute(
                "UPDATE tasks SET description = ?1 WHERE task_id = ?2",
                params![description.trim(), task_id],
            )?;
        }
        if let Some(specs) = patch.subtasks.as_deref() {
            replace_subtasks(&tx, task_id, specs)?;
        }
        touch_board(&tx, location.board_id)?;
        tx.commit()?;

        self.get_task(task_id)
    }

    /// Delete a task and its subtasks, then compact the column.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn delete_task(&self, task_id: TaskId) -> KanbanResult<()> {
        let tx = self.begin()?;
        let location = self.owned_task(&tx, task_id)?;

        let subtasks = tx.execute("DELETE FROM subtasks WHERE task_id = ?1", params![task_id])?;
        tx.execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])?;
        let shifted = close_gap::<TaskLane>(&tx, location.column_id, location.position)?;
        touch_board(&tx, location.board_id)?;
        tx.commit()?;

        tracing::info!(
            column = %location.column_id,
            task = %task_id,
            subtasks,
            shifted,
            "deleted task"
        );
        Ok(())
    }

    /// Move a task within its column or to another column of the same board.
    ///
    /// Planning and applying share one immediate transaction, so concurrent
    /// moves are serialized by the store's writer lock.
    ///
    /// # Errors
    ///
    /// - [`KanbanError::NotFound`] if the task or either column is missing
    /// - [`KanbanError::Unauthorized`] if the board belongs to someone else
    /// - [`KanbanError::InvalidMove`] if the columns are on different boards,
    ///   or the task is not at `source_index` in the source column
    /// - [`KanbanError::Storage`] if the store fails; nothing is written
    pub fn move_task(&self, request: &MoveRequest<TaskLane>) -> KanbanResult<()> {
        let tx = self.begin()?;
        let (board_id, plan) = self.prepare_task_move(&tx, request)?;
        apply_within(&tx, &plan)?;
        if !plan.is_noop() {
            touch_board(&tx, board_id)?;
        }
        tx.commit()?;

        tracing::info!(
            task = %request.item,
            source = %request.source,
            dest = %request.dest,
            to = request.dest_index,
            updates = plan.updates.len(),
            "moved task"
        );
        Ok(())
    }

    /// Plan a task move without writing anything.
    ///
    /// Apply it with [`Session::apply_task_plan`]. If either column changes in
    /// between, the apply fails with [`KanbanError::StalePlan`] and the caller
    /// plans again.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Session::move_task`].
    pub fn plan_task_move(&self, request: &MoveRequest<TaskLane>) -> KanbanResult<Plan<TaskLane>> {
        let (_, plan) = self.prepare_task_move(self.conn, request)?;
        Ok(plan)
    }

    /// Apply a plan produced by [`Session::plan_task_move`].
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::StalePlan`] if an affected column changed since
    /// planning, [`KanbanError::Unauthorized`] for a foreign column, or
    /// [`KanbanError::NotFound`] if a column or task disappeared.
    pub fn apply_task_plan(&self, plan: &Plan<TaskLane>) -> KanbanResult<()> {
        if plan.is_noop() {
            return Ok(());
        }

        let tx = self.begin()?;
        for column_id in plan.groups() {
            self.owned_column(&tx, column_id)?;
        }
        apply_within(&tx, plan)?;
        tx.commit()?;
        Ok(())
    }

    fn prepare_task_move(
        &self,
        conn: &Connection,
        request: &MoveRequest<TaskLane>,
    ) -> KanbanResult<(BoardId, Plan<TaskLane>)> {
        let task = self.owned_task(conn, request.item)?;
        let source = self.owned_column(conn, request.source)?;
        let dest = if request.is_same_group() {
            source
        } else {
            self.owned_column(conn, request.dest)?
        };

        if source.board_id != dest.board_id {
            return Err(KanbanError::InvalidMove(format!(
                "columns {} and {} are on different boards",
                request.source, request.dest
            )));
        }
        if task.column_id != request.source {
            return Err(KanbanError::InvalidMove(format!(
                "task {} is in column {}, not {}",
                request.item, task.column_id, request.source
            )));
        }

        let source_members = snapshot::<TaskLane>(conn, request.source)?;
        let dest_members = if request.is_same_group() {
            None
        } else {
            Some(snapshot::<TaskLane>(conn, request.dest)?)
        };
        let plan = plan_move(request, &source_members, dest_members.as_ref())?;
        Ok((source.board_id, plan))
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`], [`KanbanError::NotFound`], or
    /// [`KanbanError::Unauthorized`].
    pub fn add_subtask(&self, task_id: TaskId, title: &str) -> KanbanResult<Subtask> {
        let title = required("subtask title", title)?;

        let tx = self.begin()?;
        self.owned_task(&tx, task_id)?;
        let id = insert_subtask(&tx, task_id, title, false, now_us())?;
        tx.commit()?;

        Ok(Subtask {
            id,
            task_id,
            title: title.to_string(),
            is_completed: false,
        })
    }

    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn get_subtask(&self, subtask_id: SubtaskId) -> KanbanResult<Subtask> {
        self.owned_subtask(self.conn, subtask_id)
    }

    /// Rename a subtask and/or set its completion flag.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Invalid`], [`KanbanError::NotFound`], or
    /// [`KanbanError::Unauthorized`].
    pub fn update_subtask(
        &self,
        subtask_id: SubtaskId,
        title: Option<&str>,
        is_completed: Option<bool>,
    ) -> KanbanResult<Subtask> {
        let title = title
            .map(|title| required("subtask title", title))
            .transpose()?;

        let tx = self.begin()?;
        let mut subtask = self.owned_subtask(&tx, subtask_id)?;
        if let Some(title) = title {
            subtask.title = title.to_string();
        }
        if let Some(is_completed) = is_completed {
            subtask.is_completed = is_completed;
        }
        tx.execute(
            "UPDATE subtasks SET title = ?1, is_completed = ?2 WHERE subtask_id = ?3",
            params![subtask.title, subtask.is_completed, subtask_id],
        )?;
        tx.commit()?;

        Ok(subtask)
    }

    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] or [`KanbanError::Unauthorized`].
    pub fn delete_subtask(&self, subtask_id: SubtaskId) -> KanbanResult<()> {
        let tx = self.begin()?;
        self.owned_subtask(&tx, subtask_id)?;
        tx.execute(
            "DELETE FROM subtasks WHERE subtask_id = ?1",
            params![subtask_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Trimmed `value`, or [`KanbanError::Invalid`] when it is blank.
fn required<'a>(field: &str, value: &'a str) -> KanbanResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Insert a board and its columns at positions `0..columns.len()`.
pub(crate) fn insert_board(
    conn: &Connection,
    owner: UserId,
    name: &str,
    columns: &[&str],
) -> rusqlite::Result<BoardId> {
    let now = now_us();
    conn.execute(
        "INSERT INTO boards (user_id, name, created_at_us, updated_at_us) VALUES (?1, ?2, ?3, ?3)",
        params![owner, name, now],
    )?;
    let board_id = BoardId(conn.last_insert_rowid());
    for (column, position) in columns.iter().zip(0_i64..) {
        insert_column(conn, board_id, column, position, now)?;
    }
    Ok(board_id)
}

fn insert_column(
    conn: &Connection,
    board_id: BoardId,
    name: &str,
    position: i64,
    now: i64,
) -> rusqlite::Result<ColumnId> {
    conn.prepare_cached(
        "INSERT INTO columns (board_id, name, position, created_at_us) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![board_id, name, position, now])?;
    Ok(ColumnId(conn.last_insert_rowid()))
}

fn insert_subtask(
    conn: &Connection,
    task_id: TaskId,
    title: &str,
    is_completed: bool,
    now: i64,
) -> rusqlite::Result<SubtaskId> {
    conn.prepare_cached(
        "INSERT INTO subtasks (task_id, title, is_completed, created_at_us) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![task_id, title, is_completed, now])?;
    Ok(SubtaskId(conn.last_insert_rowid()))
}

fn touch_board(conn: &Connection, board_id: BoardId) -> rusqlite::Result<()> {
    conn.prepare_cached("UPDATE boards SET updated_at_us = ?1 WHERE board_id = ?2")?
        .execute(params![now_us(), board_id])?;
    Ok(())
}

/// Remove a column with its tasks and their subtasks. Returns the number of
/// tasks removed. Sibling columns are not compacted.
fn delete_column_rows(conn: &Connection, column_id: ColumnId) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM subtasks WHERE task_id IN (SELECT task_id FROM tasks WHERE column_id = ?1)",
        params![column_id],
    )?;
    let tasks = conn.execute("DELETE FROM tasks WHERE column_id = ?1", params![column_id])?;
    conn.execute("DELETE FROM columns WHERE column_id = ?1", params![column_id])?;
    Ok(tasks)
}

/// Make a board's columns match `specs`, in order.
///
/// Survivors are parked at negative ranks first, so assigning the final
/// `0..n-1` never collides with a rank still held by another column.
fn replace_columns(conn: &Connection, board_id: BoardId, specs: &[ColumnSpec]) -> KanbanResult<()> {
    let existing: HashSet<ColumnId> = query::list_columns(conn, board_id)?
        .into_iter()
        .map(|column| column.id)
        .collect();

    let mut kept = HashSet::new();
    for spec in specs {
        required("column name", &spec.name)?;
        if let Some(id) = spec.id {
            if !existing.contains(&id) {
                return Err(KanbanError::not_found(Entity::Column, id.get()));
            }
            if !kept.insert(id) {
                return Err(KanbanError::Invalid(format!("column {id} is listed twice")));
            }
        }
    }

    for column_id in existing.difference(&kept) {
        delete_column_rows(conn, *column_id)?;
    }

    conn.execute(
        "UPDATE columns SET position = -1 - position WHERE board_id = ?1",
        params![board_id],
    )?;
    let now = now_us();
    for (spec, position) in specs.iter().zip(0_i64..) {
        let name = spec.name.trim();
        match spec.id {
            Some(id) => {
                conn.execute(
                    "UPDATE columns SET name = ?1, position = ?2 WHERE column_id = ?3",
                    params![name, position, id],
                )?;
            }
            None => {
                insert_column(conn, board_id, name, position, now)?;
            }
        }
    }

    tracing::debug!(
        board = %board_id,
        kept = kept.len(),
        removed = existing.len() - kept.len(),
        total = specs.len(),
        "replaced board columns"
    );
    Ok(())
}

/// Make a task's checklist match `specs`.
fn replace_subtasks(conn: &Connection, task_id: TaskId, specs: &[SubtaskSpec]) -> KanbanResult<()> {
    let existing: HashSet<SubtaskId> = query::list_subtasks(conn, task_id)?
        .into_iter()
        .map(|subtask| subtask.id)
        .collect();

    let mut kept = HashSet::new();
    for spec in specs {
        required("subtask title", &spec.title)?;
        if let Some(id) = spec.id {
            if !existing.contains(&id) {
                return Err(KanbanError::not_found(Entity::Subtask, id.get()));
            }
            if !kept.insert(id) {
                return Err(KanbanError::Invalid(format!("subtask {id} is listed twice")));
            }
        }
    }

    for subtask_id in existing.difference(&kept) {
        conn.execute(
            "DELETE FROM subtasks WHERE subtask_id = ?1",
            params![subtask_id],
        )?;
    }

    let now = now_us();
    for spec in specs {
        let title = spec.title.trim();
        match spec.id {
            Some(id) => {
                conn.execute(
                    "UPDATE subtasks SET title = ?1, is_completed = ?2 WHERE subtask_id = ?3",
                    params![title, spec.is_completed, id],
                )?;
            }
            None => {
                insert_subtask(conn, task_id, title, spec.is_completed, now)?;
            }
        }
    }
    Ok(())
}

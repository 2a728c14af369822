//! Dense position ordering for tasks within columns and columns within boards.
//!
//! Every group (a column's tasks, a board's columns) keeps its members ranked
//! `0..n-1` with no gaps and no duplicates. Three pieces maintain that:
//!
//! - [`planner`] turns a move request plus a snapshot of the affected groups
//!   into a [`Plan`] of position updates. It never writes.
//! - [`applier`] applies a plan inside one `BEGIN IMMEDIATE` transaction,
//!   rejecting it if the groups changed since the snapshot was taken.
//! - [`compactor`] closes the gap a deleted row leaves behind, and can
//!   re-derive ranks from sort order to repair a drifted group.
//!
//! The [`Lane`] trait names the table/column pair a group lives in, so the
//! same engine ranks tasks ([`TaskLane`]) and columns ([`ColumnLane`]).

pub mod applier;
pub mod compactor;
pub mod planner;

use rusqlite::types::FromSql;
use rusqlite::{Connection, ToSql, params};
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Entity, KanbanError, KanbanResult};
use crate::model::{BoardId, ColumnId, TaskId};

/// A ranked table: rows with a `position` scoped by a parent group column.
pub trait Lane: Debug + Clone + Copy + PartialEq + Eq {
    /// Row identifier type.
    type Id: Copy + Eq + Hash + Debug + ToSql + FromSql + Into<i64>;
    /// Parent group identifier type.
    type Group: Copy + Eq + Hash + Debug + ToSql + FromSql + Into<i64>;

    /// Table holding the ranked rows.
    const TABLE: &'static str;
    /// Primary key column of [`Lane::TABLE`].
    const ID_COLUMN: &'static str;
    /// Column referencing the parent group.
    const GROUP_COLUMN: &'static str;
    /// Entity reported when a ranked row is missing.
    const ENTITY: Entity;
}

/// Tasks ranked within their column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLane;

impl Lane for TaskLane {
    type Id = TaskId;
    type Group = ColumnId;

    const TABLE: &'static str = "tasks";
    const ID_COLUMN: &'static str = "task_id";
    const GROUP_COLUMN: &'static str = "column_id";
    const ENTITY: Entity = Entity::Task;
}

/// Columns ranked within their board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLane;

impl Lane for ColumnLane {
    type Id = ColumnId;
    type Group = BoardId;

    const TABLE: &'static str = "columns";
    const ID_COLUMN: &'static str = "column_id";
    const GROUP_COLUMN: &'static str = "board_id";
    const ENTITY: Entity = Entity::Column;
}

/// One member of a group as stored: its id and recorded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<I> {
    pub id: I,
    pub position: i64,
}

/// The members of one group, ordered by `(position, id)`.
///
/// Sort order is authoritative: planning derives ranks from the index in
/// `members`, not from the stored `position` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot<L: Lane> {
    pub group: L::Group,
    pub members: Vec<Slot<L::Id>>,
}

impl<L: Lane> GroupSnapshot<L> {
    #[must_use]
    pub const fn new(group: L::Group, members: Vec<Slot<L::Id>>) -> Self {
        Self { group, members }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Index of `id` in sort order.
    #[must_use]
    pub fn index_of(&self, id: L::Id) -> Option<usize> {
        self.members.iter().position(|slot| slot.id == id)
    }

    /// Member ids in sort order.
    #[must_use]
    pub fn ids(&self) -> Vec<L::Id> {
        self.members.iter().map(|slot| slot.id).collect()
    }

    /// Whether stored positions are exactly `0..n-1` in sort order.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.members
            .iter()
            .enumerate()
            .all(|(index, slot)| i64::try_from(index).is_ok_and(|index| index == slot.position))
    }
}

/// A single write in a plan: put `id` at `position`, optionally in a new group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate<L: Lane> {
    pub id: L::Id,
    pub position: i64,
    pub group: Option<L::Group>,
}

/// The writes for one move request plus the snapshots they were computed
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan<L: Lane> {
    pub updates: Vec<PositionUpdate<L>>,
    pub fingerprint: Vec<GroupSnapshot<L>>,
}

impl<L: Lane> Plan<L> {
    /// A plan that writes nothing.
    #[must_use]
    pub const fn noop() -> Self {
        Self {
            updates: Vec::new(),
            fingerprint: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }

    /// Groups whose ranks this plan rewrites.
    #[must_use]
    pub fn groups(&self) -> Vec<L::Group> {
        self.fingerprint.iter().map(|snapshot| snapshot.group).collect()
    }
}

/// A validated request to move `item` from `source[source_index]` to
/// `dest[dest_index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest<L: Lane> {
    pub item: L::Id,
    pub source: L::Group,
    pub dest: L::Group,
    pub source_index: usize,
    pub dest_index: usize,
}

impl<L: Lane> MoveRequest<L> {
    #[must_use]
    pub const fn new(
        item: L::Id,
        source: L::Group,
        dest: L::Group,
        source_index: usize,
        dest_index: usize,
    ) -> Self {
        Self {
            item,
            source,
            dest,
            source_index,
            dest_index,
        }
    }

    /// Build a request from client-supplied indices.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::InvalidMove`] when an index is absent or
    /// negative; indices are never defaulted.
    pub fn from_raw(
        item: L::Id,
        source: L::Group,
        dest: L::Group,
        source_index: Option<i64>,
        dest_index: Option<i64>,
    ) -> KanbanResult<Self> {
        let source_index = require_index("source index", source_index)?;
        let dest_index = require_index("destination index", dest_index)?;
        Ok(Self::new(item, source, dest, source_index, dest_index))
    }

    /// Whether the request stays inside one group.
    #[must_use]
    pub fn is_same_group(&self) -> bool {
        self.source == self.dest
    }

    /// Same group, same index: nothing to do.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.is_same_group() && self.source_index == self.dest_index
    }
}

fn require_index(name: &str, raw: Option<i64>) -> KanbanResult<usize> {
    let value = raw.ok_or_else(|| KanbanError::InvalidMove(format!("missing {name}")))?;
    usize::try_from(value)
        .map_err(|_| KanbanError::InvalidMove(format!("{name} must be >= 0, got {value}")))
}

/// Read the current members of `group` ordered by `(position, id)`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn snapshot<L: Lane>(conn: &Connection, group: L::Group) -> rusqlite::Result<GroupSnapshot<L>> {
    let sql = format!(
        "SELECT {id}, position FROM {table} WHERE {group_col} = ?1 ORDER BY position ASC, {id} ASC",
        id = L::ID_COLUMN,
        table = L::TABLE,
        group_col = L::GROUP_COLUMN,
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let members = stmt
        .query_map(params![group], |row| {
            Ok(Slot {
                id: row.get(0)?,
                position: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(GroupSnapshot::new(group, members))
}

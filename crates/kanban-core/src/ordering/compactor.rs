//! Position compaction after deletes, plus density checks and repair.

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use super::applier::apply_within;
use super::{ColumnLane, Lane, Plan, PositionUpdate, TaskLane, snapshot};
use crate::error::KanbanResult;

/// Close the gap left by a row removed from `group` at `removed_position`.
///
/// Every member ranked after the removed one moves down by exactly one; the
/// members before it are untouched. Runs as two multi-row statements (park at
/// `-position`, then flip to `position - 1`) so the unique rank index never
/// sees a transient duplicate. Call it inside the transaction that performed
/// the delete.
///
/// Returns the number of rows shifted.
///
/// # Errors
///
/// Returns an error if either statement fails.
pub fn close_gap<L: Lane>(
    conn: &Connection,
    group: L::Group,
    removed_position: i64,
) -> rusqlite::Result<usize> {
    let parked = conn
        .prepare_cached(&format!(
            "UPDATE {table} SET position = -position WHERE {group_col} = ?1 AND position > ?2",
            table = L::TABLE,
            group_col = L::GROUP_COLUMN,
        ))?
        .execute(params![group, removed_position.max(0)])?;

    if parked > 0 {
        conn.prepare_cached(&format!(
            "UPDATE {table} SET position = -position - 1 WHERE {group_col} = ?1 AND position < 0",
            table = L::TABLE,
            group_col = L::GROUP_COLUMN,
        ))?
        .execute(params![group])?;
    }

    tracing::debug!(
        table = L::TABLE,
        group = ?group,
        removed_position,
        shifted = parked,
        "closed position gap"
    );
    Ok(parked)
}

/// Re-derive dense ranks for `group` from its current sort order.
///
/// Returns the number of rows rewritten (zero when already dense).
///
/// # Errors
///
/// Returns an error if reading or writing the group fails.
pub fn renumber<L: Lane>(conn: &Connection, group: L::Group) -> KanbanResult<usize> {
    let current = snapshot::<L>(conn, group)?;
    if current.is_dense() {
        return Ok(0);
    }

    let updates: Vec<PositionUpdate<L>> = current
        .members
        .iter()
        .zip(0_i64..)
        .filter(|(slot, rank)| slot.position != *rank)
        .map(|(slot, rank)| PositionUpdate {
            id: slot.id,
            position: rank,
            group: None,
        })
        .collect();
    let rewritten = updates.len();

    apply_within(
        conn,
        &Plan {
            updates,
            fingerprint: vec![current],
        },
    )?;
    Ok(rewritten)
}

/// A group whose ranks are not exactly `0..n-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DensityViolation {
    /// Ranked table (`tasks` or `columns`).
    pub table: &'static str,
    /// Group id (a column for tasks, a board for columns).
    pub group: i64,
    /// Stored positions in sort order.
    pub positions: Vec<i64>,
}

/// Find every group of `L` whose stored ranks are not dense.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn density_violations<L: Lane>(conn: &Connection) -> rusqlite::Result<Vec<DensityViolation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {group_col}
         FROM {table}
         GROUP BY {group_col}
         HAVING MIN(position) <> 0
             OR MAX(position) <> COUNT(*) - 1
             OR COUNT(DISTINCT position) <> COUNT(*)
         ORDER BY {group_col} ASC",
        table = L::TABLE,
        group_col = L::GROUP_COLUMN,
    ))?;
    let groups = stmt
        .query_map([], |row| row.get::<_, L::Group>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    groups
        .into_iter()
        .map(|group| {
            let current = snapshot::<L>(conn, group)?;
            Ok(DensityViolation {
                table: L::TABLE,
                group: group.into(),
                positions: current.members.iter().map(|slot| slot.position).collect(),
            })
        })
        .collect()
}

/// Density violations across columns (per board) and tasks (per column).
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn verify_store(conn: &Connection) -> rusqlite::Result<Vec<DensityViolation>> {
    let mut violations = density_violations::<ColumnLane>(conn)?;
    violations.extend(density_violations::<TaskLane>(conn)?);
    Ok(violations)
}

/// Renumber every non-dense group in one immediate transaction.
///
/// Returns the number of rows rewritten.
///
/// # Errors
///
/// Returns an error if any read or write fails; nothing is committed then.
pub fn repair_store(conn: &Connection) -> KanbanResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let mut rewritten = 0;
    for violation in density_violations::<ColumnLane>(&tx)? {
        rewritten += renumber::<ColumnLane>(&tx, crate::model::BoardId(violation.group))?;
    }
    for violation in density_violations::<TaskLane>(&tx)? {
        rewritten += renumber::<TaskLane>(&tx, crate::model::ColumnId(violation.group))?;
    }

    tx.execute(
        "UPDATE store_meta SET last_repair_at_us = ?1 WHERE id = 1",
        params![crate::db::now_us()],
    )?;
    tx.commit()?;

    if rewritten > 0 {
        tracing::warn!(rewritten, "repaired non-dense positions");
    }
    Ok(rewritten)
}

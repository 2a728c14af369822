//! Transactional application of a [`Plan`].
//!
//! # Contract
//!
//! - All writes of one plan commit together or not at all. The transaction is
//!   `BEGIN IMMEDIATE`, so the fingerprint check and the writes see the same
//!   state; dropping it without commit rolls everything back.
//! - The groups named in the plan's fingerprint must still look exactly as
//!   they did when the plan was computed, otherwise nothing is written and
//!   [`KanbanError::StalePlan`] is returned. A stale plan is never retried
//!   as-is; the caller re-plans against fresh state.
//! - Every updated row must be a member of a fingerprinted group, and every
//!   regrouped row must land in one. Anything else is rejected with
//!   [`KanbanError::InvalidMove`] before the first write. A plan that would
//!   leave a group non-contiguous fails the same way and rolls back.
//! - Positions are written in two phases: every updated row is first parked at
//!   `-1 - position`, then each affected group flips its parked rows back.
//!   The unique `(group, position)` index therefore never sees a transient
//!   duplicate.
//! - Success carries no payload; callers re-read the groups they need.

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use std::collections::HashSet;

use super::{Lane, Plan, snapshot};
use crate::error::{KanbanError, KanbanResult};

/// Apply `plan` in its own immediate transaction.
///
/// # Errors
///
/// - [`KanbanError::StalePlan`] if an affected group changed since planning
/// - [`KanbanError::InvalidMove`] if an update reaches outside the
///   fingerprinted groups or leaves one of them non-contiguous
/// - [`KanbanError::NotFound`] if an updated row no longer exists
/// - [`KanbanError::Storage`] on any SQLite failure
pub fn apply<L: Lane>(conn: &Connection, plan: &Plan<L>) -> KanbanResult<()> {
    if plan.is_noop() {
        return Ok(());
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    apply_within(&tx, plan)?;
    tx.commit()?;
    Ok(())
}

/// Apply `plan` on a connection that is already inside a write transaction.
///
/// The caller owns commit/rollback. On error some rows may be parked, so the
/// transaction must be rolled back (dropping it does that).
///
/// # Errors
///
/// Same as [`apply`].
pub fn apply_within<L: Lane>(conn: &Connection, plan: &Plan<L>) -> KanbanResult<()> {
    if plan.is_noop() {
        return Ok(());
    }

    verify_scope(plan)?;
    verify_fingerprint(conn, plan)?;
    park(conn, plan)?;
    unpark(conn, plan)?;
    verify_dense(conn, plan)?;

    tracing::info!(
        table = L::TABLE,
        groups = ?plan.groups(),
        updates = plan.updates.len(),
        "applied ordering plan"
    );
    Ok(())
}

fn verify_fingerprint<L: Lane>(conn: &Connection, plan: &Plan<L>) -> KanbanResult<()> {
    for expected in &plan.fingerprint {
        let current = snapshot::<L>(conn, expected.group)?;
        if current != *expected {
            tracing::warn!(
                table = L::TABLE,
                group = ?expected.group,
                expected = expected.len(),
                found = current.len(),
                "group changed since plan was computed"
            );
            return Err(KanbanError::StalePlan {
                group: expected.group.into(),
            });
        }
    }
    Ok(())
}

/// Reject updates that touch rows or groups the fingerprint does not cover.
fn verify_scope<L: Lane>(plan: &Plan<L>) -> KanbanResult<()> {
    let groups: HashSet<L::Group> = plan.groups().into_iter().collect();
    let members: HashSet<L::Id> = plan
        .fingerprint
        .iter()
        .flat_map(|snapshot| snapshot.members.iter().map(|slot| slot.id))
        .collect();

    for update in &plan.updates {
        if !members.contains(&update.id) {
            return Err(KanbanError::InvalidMove(format!(
                "{} {} is not in any group of the plan",
                L::ENTITY,
                Into::<i64>::into(update.id)
            )));
        }
        if let Some(group) = update.group.filter(|group| !groups.contains(group)) {
            return Err(KanbanError::InvalidMove(format!(
                "{} {} targets group {} outside the plan",
                L::ENTITY,
                Into::<i64>::into(update.id),
                Into::<i64>::into(group)
            )));
        }
    }
    Ok(())
}

/// Every rewritten group must end up ranked `0..n-1`.
fn verify_dense<L: Lane>(conn: &Connection, plan: &Plan<L>) -> KanbanResult<()> {
    for group in plan.groups() {
        if !snapshot::<L>(conn, group)?.is_dense() {
            return Err(KanbanError::InvalidMove(format!(
                "plan leaves group {} with non-contiguous positions",
                Into::<i64>::into(group)
            )));
        }
    }
    Ok(())
}

fn park<L: Lane>(conn: &Connection, plan: &Plan<L>) -> KanbanResult<()> {
    let mut regroup = conn.prepare_cached(&format!(
        "UPDATE {table} SET {group} = ?1, position = ?2 WHERE {id} = ?3",
        table = L::TABLE,
        group = L::GROUP_COLUMN,
        id = L::ID_COLUMN,
    ))?;
    let mut reposition = conn.prepare_cached(&format!(
        "UPDATE {table} SET position = ?1 WHERE {id} = ?2",
        table = L::TABLE,
        id = L::ID_COLUMN,
    ))?;

    for update in &plan.updates {
        let parked = -1 - update.position;
        let changed = match update.group {
            Some(group) => regroup.execute(params![group, parked, update.id])?,
            None => reposition.execute(params![parked, update.id])?,
        };
        if changed == 0 {
            return Err(KanbanError::not_found(L::ENTITY, update.id.into()));
        }
    }
    Ok(())
}

fn unpark<L: Lane>(conn: &Connection, plan: &Plan<L>) -> KanbanResult<()> {
    let mut flip = conn.prepare_cached(&format!(
        "UPDATE {table} SET position = -1 - position WHERE {group} = ?1 AND position < 0",
        table = L::TABLE,
        group = L::GROUP_COLUMN,
    ))?;
    for group in plan.groups() {
        flip.execute(params![group])?;
    }
    Ok(())
}

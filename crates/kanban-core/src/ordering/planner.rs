//! Move planning: pure functions from a request and group snapshots to a
//! [`Plan`].
//!
//! # Same-group reorder
//!
//! The snapshot's sort order is the current arrangement. The item is spliced
//! out at `source_index` and re-inserted at `min(dest_index, len)`; every
//! member whose new index differs from its stored position gets an update.
//!
//! # Cross-group move
//!
//! The item leaves the source, which closes up (later members shift down by
//! one), and enters the destination at `min(dest_index, dest_len)` (members at
//! or after that index shift up by one). The item's own update carries the new
//! group reference.
//!
//! In both cases ranks are re-derived from sort order, so a group whose stored
//! positions drifted comes out dense again.

use super::{GroupSnapshot, Lane, MoveRequest, Plan, PositionUpdate};
use crate::error::{KanbanError, KanbanResult};

/// Plan a move of `request.item`.
///
/// `dest` must be `None` for a same-group move and the destination snapshot
/// otherwise.
///
/// # Errors
///
/// Returns [`KanbanError::InvalidMove`] when the snapshots do not match the
/// request, the item is not in the source group, or the item is not at
/// `source_index` (the caller's view of the group is stale).
pub fn plan_move<L: Lane>(
    request: &MoveRequest<L>,
    source: &GroupSnapshot<L>,
    dest: Option<&GroupSnapshot<L>>,
) -> KanbanResult<Plan<L>> {
    if source.group != request.source {
        return Err(KanbanError::InvalidMove(format!(
            "snapshot is for group {:?}, request names {:?}",
            source.group, request.source
        )));
    }

    let Some(current_index) = source.index_of(request.item) else {
        return Err(KanbanError::InvalidMove(format!(
            "{:?} is not in group {:?}",
            request.item, request.source
        )));
    };

    if current_index != request.source_index {
        return Err(KanbanError::InvalidMove(format!(
            "{:?} is at index {current_index}, not {}",
            request.item, request.source_index
        )));
    }

    if request.is_same_group() {
        if request.is_noop() {
            return Ok(Plan::noop());
        }
        return Ok(plan_reorder(request, source));
    }

    let Some(dest) = dest else {
        return Err(KanbanError::InvalidMove(
            "cross-group move needs a destination snapshot".into(),
        ));
    };
    if dest.group != request.dest {
        return Err(KanbanError::InvalidMove(format!(
            "snapshot is for group {:?}, request names {:?}",
            dest.group, request.dest
        )));
    }

    Ok(plan_transfer(request, source, dest))
}

fn plan_reorder<L: Lane>(request: &MoveRequest<L>, group: &GroupSnapshot<L>) -> Plan<L> {
    let mut arrangement = group.ids();
    let moved = arrangement.remove(request.source_index);
    let insert_at = request.dest_index.min(arrangement.len());
    arrangement.insert(insert_at, moved);

    let mut updates = Vec::new();
    push_changed(&mut updates, group, &arrangement);

    tracing::debug!(
        item = ?request.item,
        group = ?request.source,
        from = request.source_index,
        to = insert_at,
        updates = updates.len(),
        "planned same-group reorder"
    );

    Plan {
        updates,
        fingerprint: vec![group.clone()],
    }
}

fn plan_transfer<L: Lane>(
    request: &MoveRequest<L>,
    source: &GroupSnapshot<L>,
    dest: &GroupSnapshot<L>,
) -> Plan<L> {
    let mut remaining = source.ids();
    remaining.remove(request.source_index);

    let mut arrived: Vec<L::Id> = dest
        .ids()
        .into_iter()
        .filter(|id| *id != request.item)
        .collect();
    let insert_at = request.dest_index.min(arrived.len());
    arrived.insert(insert_at, request.item);

    let mut updates = Vec::new();
    push_changed(&mut updates, source, &remaining);
    for (index, id) in arrived.iter().enumerate() {
        let position = rank(index);
        if *id == request.item {
            updates.push(PositionUpdate {
                id: *id,
                position,
                group: Some(request.dest),
            });
        } else if stored_position(dest, *id) != Some(position) {
            updates.push(PositionUpdate {
                id: *id,
                position,
                group: None,
            });
        }
    }

    tracing::debug!(
        item = ?request.item,
        source = ?request.source,
        dest = ?request.dest,
        to = insert_at,
        updates = updates.len(),
        "planned cross-group move"
    );

    Plan {
        updates,
        fingerprint: vec![source.clone(), dest.clone()],
    }
}

/// Push an update for every member of `arrangement` whose index differs from
/// its stored position in `group`.
fn push_changed<L: Lane>(
    updates: &mut Vec<PositionUpdate<L>>,
    group: &GroupSnapshot<L>,
    arrangement: &[L::Id],
) {
    for (index, id) in arrangement.iter().enumerate() {
        let position = rank(index);
        if stored_position(group, *id) != Some(position) {
            updates.push(PositionUpdate {
                id: *id,
                position,
                group: None,
            });
        }
    }
}

fn stored_position<L: Lane>(group: &GroupSnapshot<L>, id: L::Id) -> Option<i64> {
    group
        .members
        .iter()
        .find(|slot| slot.id == id)
        .map(|slot| slot.position)
}

fn rank(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Apply a plan to in-memory snapshots and return the resulting groups in sort
/// order. Used to check plans without touching the store.
#[must_use]
pub fn simulate<L: Lane>(plan: &Plan<L>) -> Vec<GroupSnapshot<L>> {
    let mut groups: Vec<GroupSnapshot<L>> = plan.fingerprint.clone();

    for update in &plan.updates {
        let mut slot = None;
        for group in &mut groups {
            if let Some(index) = group.index_of(update.id) {
                slot = Some(group.members.remove(index));
                break;
            }
        }
        let Some(mut slot) = slot else { continue };
        slot.position = update.position;

        let home = update.group.or_else(|| {
            plan.fingerprint
                .iter()
                .find(|snapshot| snapshot.index_of(update.id).is_some())
                .map(|snapshot| snapshot.group)
        });
        if let Some(group) = home.and_then(|home| groups.iter_mut().find(|g| g.group == home)) {
            group.members.push(slot);
        }
    }

    for group in &mut groups {
        group
            .members
            .sort_by_key(|slot| (slot.position, Into::<i64>::into(slot.id)));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::{plan_move, simulate};
    use crate::error::KanbanError;
    use crate::model::{ColumnId, TaskId};
    use crate::ordering::{GroupSnapshot, MoveRequest, Slot, TaskLane};

    const A: ColumnId = ColumnId(1);
    const B: ColumnId = ColumnId(2);

    fn group(id: ColumnId, tasks: &[i64]) -> GroupSnapshot<TaskLane> {
        GroupSnapshot::new(
            id,
            tasks
                .iter()
                .zip(0_i64..)
                .map(|(&task, position)| Slot {
                    id: TaskId(task),
                    position,
                })
                .collect(),
        )
    }

    fn order(snapshot: &GroupSnapshot<TaskLane>) -> Vec<(i64, i64)> {
        snapshot
            .members
            .iter()
            .map(|slot| (slot.id.get(), slot.position))
            .collect()
    }

    #[test]
    fn reorder_first_to_last() {
        let a = group(A, &[1, 2, 3]);
        let plan = plan_move(&MoveRequest::new(TaskId(1), A, A, 0, 2), &a, None).expect("plan");

        let after = simulate(&plan);
        assert_eq!(order(&after[0]), vec![(2, 0), (3, 1), (1, 2)]);
        assert_eq!(plan.updates.len(), 3);
    }

    #[test]
    fn reorder_only_touches_the_affected_span() {
        let a = group(A, &[1, 2, 3, 4, 5]);
        let plan = plan_move(&MoveRequest::new(TaskId(2), A, A, 1, 2), &a, None).expect("plan");

        let touched: Vec<i64> = plan.updates.iter().map(|u| u.id.get()).collect();
        assert_eq!(touched, vec![3, 2]);
        assert_eq!(
            order(&simulate(&plan)[0]),
            vec![(1, 0), (3, 1), (2, 2), (4, 3), (5, 4)]
        );
    }

    #[test]
    fn reorder_past_end_appends() {
        let a = group(A, &[1, 2, 3]);
        let plan = plan_move(&MoveRequest::new(TaskId(1), A, A, 0, 99), &a, None).expect("plan");
        assert_eq!(order(&simulate(&plan)[0]), vec![(2, 0), (3, 1), (1, 2)]);
    }

    #[test]
    fn same_index_is_noop() {
        let a = group(A, &[1, 2, 3]);
        let plan = plan_move(&MoveRequest::new(TaskId(2), A, A, 1, 1), &a, None).expect("plan");
        assert!(plan.is_noop());
        assert!(plan.fingerprint.is_empty());
    }

    #[test]
    fn transfer_appends_to_destination() {
        let a = group(A, &[1, 2]);
        let b = group(B, &[3]);
        let plan =
            plan_move(&MoveRequest::new(TaskId(1), A, B, 0, 1), &a, Some(&b)).expect("plan");

        let after = simulate(&plan);
        assert_eq!(order(&after[0]), vec![(2, 0)]);
        assert_eq!(order(&after[1]), vec![(3, 0), (1, 1)]);

        let moved = plan
            .updates
            .iter()
            .find(|u| u.id == TaskId(1))
            .expect("moved item update");
        assert_eq!(moved.group, Some(B));
        assert_eq!(moved.position, 1);
    }

    #[test]
    fn transfer_into_middle_shifts_later_members() {
        let a = group(A, &[1, 2, 3]);
        let b = group(B, &[4, 5, 6]);
        let plan =
            plan_move(&MoveRequest::new(TaskId(2), A, B, 1, 1), &a, Some(&b)).expect("plan");

        let after = simulate(&plan);
        assert_eq!(order(&after[0]), vec![(1, 0), (3, 1)]);
        assert_eq!(order(&after[1]), vec![(4, 0), (2, 1), (5, 2), (6, 3)]);

        let untouched = plan.updates.iter().any(|u| u.id == TaskId(1) || u.id == TaskId(4));
        assert!(!untouched, "members before the gap/slot keep their rows");
    }

    #[test]
    fn transfer_into_empty_group_clamps_index() {
        let a = group(A, &[1]);
        let b = group(B, &[]);
        let plan =
            plan_move(&MoveRequest::new(TaskId(1), A, B, 0, 5), &a, Some(&b)).expect("plan");

        let after = simulate(&plan);
        assert!(after[0].members.is_empty());
        assert_eq!(order(&after[1]), vec![(1, 0)]);
    }

    #[test]
    fn drifted_positions_are_healed() {
        let a = GroupSnapshot::new(
            A,
            vec![
                Slot { id: TaskId(1), position: 0 },
                Slot { id: TaskId(2), position: 4 },
                Slot { id: TaskId(3), position: 9 },
            ],
        );
        let plan = plan_move(&MoveRequest::new(TaskId(3), A, A, 2, 0), &a, None).expect("plan");
        let after = simulate(&plan);
        assert!(after[0].is_dense());
        assert_eq!(order(&after[0]), vec![(3, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn stale_source_index_is_rejected() {
        let a = group(A, &[1, 2, 3]);
        let result = plan_move(&MoveRequest::new(TaskId(1), A, A, 2, 0), &a, None);
        assert!(matches!(result, Err(KanbanError::InvalidMove(_))));
    }

    #[test]
    fn item_missing_from_source_is_rejected() {
        let a = group(A, &[1, 2]);
        let b = group(B, &[3]);
        let result = plan_move(&MoveRequest::new(TaskId(3), A, B, 0, 0), &a, Some(&b));
        assert!(matches!(result, Err(KanbanError::InvalidMove(_))));
    }

    #[test]
    fn cross_group_without_destination_snapshot_is_rejected() {
        let a = group(A, &[1]);
        let result = plan_move(&MoveRequest::new(TaskId(1), A, B, 0, 0), &a, None);
        assert!(matches!(result, Err(KanbanError::InvalidMove(_))));
    }
}

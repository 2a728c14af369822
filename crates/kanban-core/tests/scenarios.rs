//! End-to-end ordering scenarios through the service layer: moves, deletes,
//! ownership, and failure atomicity against an on-disk store.

use kanban_core::accounts::signup;
use kanban_core::config::SignupConfig;
use kanban_core::db::{DEFAULT_BUSY_TIMEOUT, open_store};
use kanban_core::error::KanbanError;
use kanban_core::model::{BoardView, ColumnId, TaskId};
use kanban_core::ordering::compactor::verify_store;
use kanban_core::ordering::{Plan, PositionUpdate, snapshot};
use kanban_core::{MoveRequest, Session, TaskLane};
use rusqlite::Connection;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

struct Fixture {
    _dir: TempDir,
    conn: Connection,
    user: kanban_core::model::UserId,
    board: BoardView,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let conn = open_store(&dir.path().join("kanban.db"), DEFAULT_BUSY_TIMEOUT)
            .expect("open store");
        let account =
            signup(&conn, &SignupConfig::default(), "Ada", "ada@example.com").expect("signup");
        Self {
            _dir: dir,
            conn,
            user: account.user.id,
            board: account.board,
        }
    }

    fn session(&self) -> Session<'_> {
        Session::new(&self.conn, self.user)
    }

    fn column(&self, index: usize) -> ColumnId {
        self.board.columns[index].column.id
    }

    fn add_tasks(&self, column: ColumnId, titles: &[&str]) -> Vec<TaskId> {
        titles
            .iter()
            .map(|title| {
                self.session()
                    .create_task(column, title, "", &[])
                    .expect("create task")
                    .task
                    .id
            })
            .collect()
    }

    /// `(title, position)` of each task in `column`, in display order.
    fn titles(&self, column: ColumnId) -> Vec<(String, i64)> {
        let board = self.session().get_board(self.board.board.id).expect("board");
        board
            .column(column)
            .expect("column on board")
            .tasks
            .iter()
            .map(|view| (view.task.title.clone(), view.task.position))
            .collect()
    }

    fn assert_dense(&self) {
        let violations = verify_store(&self.conn).expect("verify");
        assert!(violations.is_empty(), "non-dense groups: {violations:?}");
    }
}

fn ranked(titles: &[&str]) -> Vec<(String, i64)> {
    titles
        .iter()
        .zip(0_i64..)
        .map(|(title, position)| ((*title).to_string(), position))
        .collect()
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

#[test]
fn reorder_within_column() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1", "T2", "T3"]);

    fx.session()
        .move_task(&MoveRequest::new(tasks[0], a, a, 0, 2))
        .expect("move");

    assert_eq!(fx.titles(a), ranked(&["T2", "T3", "T1"]));
    fx.assert_dense();
}

#[test]
fn move_across_columns() {
    let fx = Fixture::new();
    let (a, b) = (fx.column(0), fx.column(1));
    let tasks = fx.add_tasks(a, &["T1", "T2"]);
    fx.add_tasks(b, &["T3"]);

    fx.session()
        .move_task(&MoveRequest::new(tasks[0], a, b, 0, 1))
        .expect("move");

    assert_eq!(fx.titles(a), ranked(&["T2"]));
    assert_eq!(fx.titles(b), ranked(&["T3", "T1"]));
    let moved = fx.session().get_task(tasks[0]).expect("task");
    assert_eq!(moved.task.column_id, b);
    fx.assert_dense();
}

#[test]
fn move_into_empty_column_clamps_index() {
    let fx = Fixture::new();
    let (a, c) = (fx.column(0), fx.column(2));
    let tasks = fx.add_tasks(a, &["T1"]);

    fx.session()
        .move_task(&MoveRequest::new(tasks[0], a, c, 0, 40))
        .expect("move");

    assert!(fx.titles(a).is_empty());
    assert_eq!(fx.titles(c), ranked(&["T1"]));
}

#[test]
fn same_index_move_is_a_noop() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1", "T2"]);

    fx.session()
        .move_task(&MoveRequest::new(tasks[1], a, a, 1, 1))
        .expect("noop move");

    assert_eq!(fx.titles(a), ranked(&["T1", "T2"]));
}

#[test]
fn round_trip_restores_both_columns() {
    let fx = Fixture::new();
    let (a, b) = (fx.column(0), fx.column(1));
    let tasks = fx.add_tasks(a, &["T1", "T2", "T3"]);
    fx.add_tasks(b, &["U1", "U2"]);

    fx.session()
        .move_task(&MoveRequest::new(tasks[1], a, b, 1, 1))
        .expect("move out");
    fx.session()
        .move_task(&MoveRequest::new(tasks[1], b, a, 1, 1))
        .expect("move back");

    assert_eq!(fx.titles(a), ranked(&["T1", "T2", "T3"]));
    assert_eq!(fx.titles(b), ranked(&["U1", "U2"]));
}

#[test]
fn stale_source_index_is_invalid_and_writes_nothing() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1", "T2", "T3"]);

    let result = fx
        .session()
        .move_task(&MoveRequest::new(tasks[0], a, a, 1, 2));

    assert!(matches!(result, Err(KanbanError::InvalidMove(_))));
    assert_eq!(fx.titles(a), ranked(&["T1", "T2", "T3"]));
}

#[test]
fn wrong_source_column_is_invalid() {
    let fx = Fixture::new();
    let (a, b) = (fx.column(0), fx.column(1));
    let tasks = fx.add_tasks(a, &["T1"]);

    let result = fx
        .session()
        .move_task(&MoveRequest::new(tasks[0], b, a, 0, 0));

    assert!(matches!(result, Err(KanbanError::InvalidMove(_))));
}

#[test]
fn move_to_another_board_is_invalid() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1"]);
    let other = fx
        .session()
        .create_board("Side project", &["Ideas".into()])
        .expect("board");
    let foreign_column = other.columns[0].column.id;

    let result = fx
        .session()
        .move_task(&MoveRequest::new(tasks[0], a, foreign_column, 0, 0));

    assert!(matches!(result, Err(KanbanError::InvalidMove(_))));
    assert_eq!(fx.titles(a), ranked(&["T1"]));
}

#[test]
fn moving_a_deleted_task_is_not_found() {
    let fx = Fixture::new();
    let (a, b) = (fx.column(0), fx.column(1));
    let tasks = fx.add_tasks(a, &["T1", "T2"]);
    fx.add_tasks(b, &["T3"]);
    fx.session().delete_task(tasks[0]).expect("delete");

    let result = fx
        .session()
        .move_task(&MoveRequest::new(tasks[0], a, b, 0, 0));

    assert!(matches!(result, Err(KanbanError::NotFound { .. })));
    assert_eq!(fx.titles(a), ranked(&["T2"]));
    assert_eq!(fx.titles(b), ranked(&["T3"]));
}

#[test]
fn missing_destination_column_is_not_found() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1"]);

    let result = fx
        .session()
        .move_task(&MoveRequest::new(tasks[0], a, ColumnId(9_999), 0, 0));

    assert!(matches!(result, Err(KanbanError::NotFound { .. })));
}

#[test]
fn stale_plan_is_rejected_and_replanning_succeeds() {
    let fx = Fixture::new();
    let (a, b) = (fx.column(0), fx.column(1));
    let tasks = fx.add_tasks(a, &["T1", "T2", "T3"]);

    let request = MoveRequest::new(tasks[2], a, b, 2, 0);
    let plan = fx.session().plan_task_move(&request).expect("plan");

    fx.session().delete_task(tasks[0]).expect("concurrent delete");

    let err = fx
        .session()
        .apply_task_plan(&plan)
        .expect_err("plan is stale");
    assert!(matches!(err, KanbanError::StalePlan { .. }));
    assert!(err.is_retryable());
    assert_eq!(fx.titles(a), ranked(&["T2", "T3"]));
    assert!(fx.titles(b).is_empty());

    let fresh = MoveRequest::new(tasks[2], a, b, 1, 0);
    let replanned = fx.session().plan_task_move(&fresh).expect("replan");
    fx.session().apply_task_plan(&replanned).expect("apply");
    assert_eq!(fx.titles(a), ranked(&["T2"]));
    assert_eq!(fx.titles(b), ranked(&["T3"]));
}

// ---------------------------------------------------------------------------
// Deletes and compaction
// ---------------------------------------------------------------------------

#[test]
fn delete_task_compacts_column() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1", "T2", "T3"]);

    fx.session().delete_task(tasks[1]).expect("delete");

    assert_eq!(fx.titles(a), ranked(&["T1", "T3"]));
    fx.assert_dense();
}

#[test]
fn delete_missing_task_is_not_found() {
    let fx = Fixture::new();
    let result = fx.session().delete_task(TaskId(4_242));
    assert!(matches!(result, Err(KanbanError::NotFound { .. })));
}

#[test]
fn delete_column_removes_dependents_and_compacts_columns() {
    let fx = Fixture::new();
    let doing = fx.column(1);
    fx.session()
        .create_task(doing, "with checklist", "", &["a".into(), "b".into()])
        .expect("task");

    fx.session().delete_column(doing).expect("delete column");

    let board = fx.session().get_board(fx.board.board.id).expect("board");
    let columns: Vec<(&str, i64)> = board
        .columns
        .iter()
        .map(|view| (view.column.name.as_str(), view.column.position))
        .collect();
    assert_eq!(columns, vec![("TODO", 0), ("DONE", 1)]);

    let (tasks, subtasks): (i64, i64) = fx
        .conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM tasks), (SELECT COUNT(*) FROM subtasks)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("count rows");
    assert_eq!((tasks, subtasks), (0, 0));
}

#[test]
fn delete_board_removes_everything_it_holds() {
    let fx = Fixture::new();
    fx.session()
        .create_task(fx.column(0), "T1", "", &["s".into()])
        .expect("task");

    fx.session().delete_board(fx.board.board.id).expect("delete board");

    assert!(fx.session().list_boards().expect("list").is_empty());
    let columns: i64 = fx
        .conn
        .query_row("SELECT COUNT(*) FROM columns", [], |row| row.get(0))
        .expect("count columns");
    assert_eq!(columns, 0);
}

#[test]
fn new_items_take_sibling_count_as_position() {
    let fx = Fixture::new();
    let a = fx.column(0);
    fx.add_tasks(a, &["T1", "T2"]);

    let created = fx
        .session()
        .create_task(a, "T3", "notes", &[])
        .expect("task");
    assert_eq!(created.task.position, 2);

    let column = fx
        .session()
        .create_column(fx.board.board.id, "Archive")
        .expect("column");
    assert_eq!(column.position, 3);
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[test]
fn foreign_board_is_unauthorized() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1", "T2"]);
    let intruder = signup(
        &fx.conn,
        &SignupConfig::default(),
        "Mallory",
        "mallory@example.com",
    )
    .expect("signup");
    let session = Session::new(&fx.conn, intruder.user.id);

    let moved = session.move_task(&MoveRequest::new(tasks[0], a, a, 0, 1));
    assert!(matches!(moved, Err(KanbanError::Unauthorized)));

    let read = session.get_board(fx.board.board.id);
    assert!(matches!(read, Err(KanbanError::Unauthorized)));

    let deleted = session.delete_column(a);
    assert!(matches!(deleted, Err(KanbanError::Unauthorized)));

    assert_eq!(fx.titles(a), ranked(&["T1", "T2"]));
    assert_eq!(session.list_boards().expect("list").len(), 1);
}

#[test]
fn hand_built_plan_cannot_take_a_foreign_task() {
    let fx = Fixture::new();
    let a = fx.column(0);
    let tasks = fx.add_tasks(a, &["T1", "T2"]);
    let intruder = signup(
        &fx.conn,
        &SignupConfig::default(),
        "Mallory",
        "mallory@example.com",
    )
    .expect("signup");
    let session = Session::new(&fx.conn, intruder.user.id);
    let own_column = intruder.board.columns[0].column.id;

    let plan = Plan::<TaskLane> {
        updates: vec![PositionUpdate {
            id: tasks[0],
            position: 0,
            group: Some(own_column),
        }],
        fingerprint: vec![snapshot::<TaskLane>(&fx.conn, own_column).expect("snapshot")],
    };
    let err = session
        .apply_task_plan(&plan)
        .expect_err("task belongs to another board");
    assert!(matches!(err, KanbanError::InvalidMove(_)));

    let target = fx.session().get_task(tasks[0]).expect("task");
    assert_eq!(target.task.column_id, a);
    assert_eq!(fx.titles(a), ranked(&["T1", "T2"]));
    fx.assert_dense();
}

#[test]
fn board_view_serializes_flat() {
    let fx = Fixture::new();
    fx.add_tasks(fx.column(0), &["T1"]);
    let board = fx.session().get_board(fx.board.board.id).expect("board");

    let json = serde_json::to_value(&board).expect("serialize");
    assert_eq!(json["name"], "My First Board");
    assert_eq!(json["columns"][0]["name"], "TODO");
    assert_eq!(json["columns"][0]["tasks"][0]["title"], "T1");
    assert_eq!(json["columns"][0]["tasks"][0]["position"], 0);
}

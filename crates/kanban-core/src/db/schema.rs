//! Canonical SQLite schema for the board store.
//!
//! - `users` owns `boards`; `boards` hold ranked `columns`; `columns` hold
//!   ranked `tasks`; `tasks` hold unordered `subtasks`
//! - foreign keys carry no `ON DELETE` action: delete operations remove
//!   dependents explicitly inside the same transaction
//! - `(board_id, position)` and `(column_id, position)` are unique, so a
//!   duplicate rank can never be committed
//! - `store_meta` tracks the schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    email TEXT NOT NULL UNIQUE COLLATE NOCASE CHECK (length(trim(email)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS boards (
    board_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS columns (
    column_id INTEGER PRIMARY KEY,
    board_id INTEGER NOT NULL REFERENCES boards(board_id),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    position INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id INTEGER PRIMARY KEY,
    column_id INTEGER NOT NULL REFERENCES columns(column_id),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    position INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS subtasks (
    subtask_id INTEGER PRIMARY KEY,
    task_id INTEGER NOT NULL REFERENCES tasks(task_id),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    is_completed INTEGER NOT NULL DEFAULT 0 CHECK (is_completed IN (0, 1)),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_repair_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, last_repair_at_us)
VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes and the unique rank indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_boards_user_created
    ON boards(user_id, created_at_us, board_id);

CREATE UNIQUE INDEX IF NOT EXISTS idx_columns_board_position
    ON columns(board_id, position);

CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_column_position
    ON tasks(column_id, position);

CREATE INDEX IF NOT EXISTS idx_subtasks_task
    ON subtasks(task_id, subtask_id);
";

/// Indexes the store relies on for ordered reads and rank uniqueness.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_boards_user_created",
    "idx_columns_board_position",
    "idx_tasks_column_position",
    "idx_subtasks_task",
];

//! Account registration and principal resolution.
//!
//! Credentials are not modelled: a principal is the user row an email
//! resolves to.

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::config::SignupConfig;
use crate::db::{now_us, query};
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::model::{BoardView, User, UserId};
use crate::service::insert_board;

/// A freshly registered user and the board seeded for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub user: User,
    pub board: BoardView,
}

/// Register a user and seed their default board.
///
/// # Errors
///
/// - [`KanbanError::Invalid`] for a blank name or an email without `@`
/// - [`KanbanError::Conflict`] if the email is already registered
///   (case-insensitive)
/// - [`KanbanError::Storage`] if the store fails; nothing is written
pub fn signup(
    conn: &Connection,
    config: &SignupConfig,
    name: &str,
    email: &str,
) -> KanbanResult<Account> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(KanbanError::Invalid("name is required".into()));
    }
    if !email.contains('@') {
        return Err(KanbanError::Invalid(format!("'{email}' is not an email address")));
    }
    let columns: Vec<&str> = config
        .default_columns
        .iter()
        .map(|column| column.trim())
        .filter(|column| !column.is_empty())
        .collect();

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if query::find_user_by_email(&tx, email)?.is_some() {
        return Err(KanbanError::Conflict(format!(
            "a user with email {email} already exists"
        )));
    }

    let now = now_us();
    tx.execute(
        "INSERT INTO users (name, email, created_at_us) VALUES (?1, ?2, ?3)",
        params![name, email, now],
    )?;
    let user_id = UserId(tx.last_insert_rowid());
    let board_id = insert_board(&tx, user_id, config.default_board.trim(), &columns)?;

    let user = query::get_user(&tx, user_id)?
        .ok_or_else(|| KanbanError::not_found(Entity::User, user_id.get()))?;
    let board = query::load_board_view(&tx, board_id)?
        .ok_or_else(|| KanbanError::not_found(Entity::Board, board_id.get()))?;
    tx.commit()?;

    tracing::info!(user = %user_id, board = %board_id, "registered user");
    Ok(Account { user, board })
}

/// Look up the user registered under `email`.
///
/// # Errors
///
/// Returns [`KanbanError::UnknownUser`] if there is none.
pub fn resolve_user(conn: &Connection, email: &str) -> KanbanResult<User> {
    query::find_user_by_email(conn, email)?
        .ok_or_else(|| KanbanError::UnknownUser(email.trim().to_string()))
}

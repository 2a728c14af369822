//! Per-invocation state shared by command handlers: project root, resolved
//! config and output mode, and the acting user.

use anyhow::Result;
use kanban_core::config::{EffectiveConfig, store_path};
use kanban_core::db::try_open_store;
use kanban_core::error::ErrorCode;
use kanban_core::{KanbanError, Session};
use rusqlite::Connection;
use std::fmt;
use std::path::PathBuf;

use crate::output::{CliError, OutputMode, render_error};

/// Environment variable naming the acting user's email.
pub const USER_ENV: &str = "KANBAN_USER";

/// An error that has already been rendered to stderr. `main` only turns it
/// into a failing exit code.
#[derive(Debug)]
pub struct Reported(pub String);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

#[derive(Debug)]
pub struct Context {
    pub root: PathBuf,
    pub output: OutputMode,
    pub quiet: bool,
    pub config: EffectiveConfig,
    user_flag: Option<String>,
}

impl Context {
    pub fn new(
        root: PathBuf,
        config: EffectiveConfig,
        user_flag: Option<String>,
        quiet: bool,
    ) -> Self {
        let output = OutputMode::from_resolved(&config.resolved_output);
        Self {
            root,
            output,
            quiet,
            config,
            user_flag,
        }
    }

    /// Open the store, reporting a missing one as `NotInitialized`.
    pub fn open_store(&self) -> Result<Connection> {
        let path = store_path(&self.root);
        let busy_timeout = self.config.project.store.busy_timeout();
        if let Some(conn) = try_open_store(&path, busy_timeout)? {
            return Ok(conn);
        }

        let code = ErrorCode::NotInitialized;
        render_error(
            self.output,
            &CliError::with_details(
                format!("{} at {}", code.message(), path.display()),
                code.hint().unwrap_or_default(),
                code.code(),
            ),
        )?;
        Err(Reported("store not initialized".to_string()).into())
    }

    /// The acting user's email: `--user`, then `KANBAN_USER`, then the user
    /// config file.
    pub fn user_email(&self) -> Option<String> {
        resolve_user_email(
            self.user_flag.as_deref(),
            std::env::var(USER_ENV).ok().as_deref(),
            self.config.user.user.as_deref(),
        )
    }

    /// Open a session as the acting user.
    pub fn session<'conn>(&self, conn: &'conn Connection) -> Result<Session<'conn>> {
        let Some(email) = self.user_email() else {
            let code = ErrorCode::UnknownUser;
            render_error(
                self.output,
                &CliError::with_details(
                    "no acting user",
                    format!("Pass --user <email> or set {USER_ENV}."),
                    code.code(),
                ),
            )?;
            return Err(Reported("no acting user".to_string()).into());
        };
        Session::for_email(conn, &email).map_err(|err| self.fail(err))
    }

    /// Render a board error and convert it for `main`'s exit path.
    pub fn fail(&self, err: KanbanError) -> anyhow::Error {
        if let Err(render_err) = render_error(self.output, &CliError::from(&err)) {
            tracing::warn!(error = %render_err, "failed to render error");
        }
        tracing::debug!(code = err.code().code(), error = %err, "command failed");
        Reported(err.to_string()).into()
    }
}

fn resolve_user_email(
    flag: Option<&str>,
    env: Option<&str>,
    config: Option<&str>,
) -> Option<String> {
    [flag, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

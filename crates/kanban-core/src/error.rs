use std::fmt;

/// Machine-readable error codes for client-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UnknownUser,
    BoardNotFound,
    ColumnNotFound,
    TaskNotFound,
    SubtaskNotFound,
    InvalidMove,
    InvalidInput,
    Unauthorized,
    DuplicateEmail,
    StalePlan,
    StorageFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UnknownUser => "E1003",
            Self::BoardNotFound => "E2001",
            Self::ColumnNotFound => "E2002",
            Self::TaskNotFound => "E2003",
            Self::SubtaskNotFound => "E2004",
            Self::InvalidMove => "E3001",
            Self::InvalidInput => "E3002",
            Self::Unauthorized => "E4001",
            Self::DuplicateEmail => "E4002",
            Self::StalePlan => "E5001",
            Self::StorageFailure => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board store not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownUser => "Unknown user",
            Self::BoardNotFound => "Board not found",
            Self::ColumnNotFound => "Column not found",
            Self::TaskNotFound => "Task not found",
            Self::SubtaskNotFound => "Subtask not found",
            Self::InvalidMove => "Invalid move",
            Self::InvalidInput => "Invalid input",
            Self::Unauthorized => "Unauthorized",
            Self::DuplicateEmail => "User with this email already exists",
            Self::StalePlan => "Ordering changed since the move was planned",
            Self::StorageFailure => "Storage failure",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and clients.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `kanban init` to create the board store."),
            Self::ConfigParseError => Some("Fix syntax in .kanban/config.toml and retry."),
            Self::UnknownUser => Some("Run `kanban signup` or pass --user with a known email."),
            Self::BoardNotFound
            | Self::ColumnNotFound
            | Self::TaskNotFound
            | Self::SubtaskNotFound => Some("Re-fetch the board; it may have been deleted."),
            Self::InvalidMove => Some("Re-fetch the board and retry with current indices."),
            Self::InvalidInput => None,
            Self::Unauthorized => Some("Only the board owner can change it."),
            Self::DuplicateEmail => Some("Sign in with the existing account instead."),
            Self::StalePlan | Self::StorageFailure => {
                Some("Retry the move; it will be re-planned against fresh state.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Kind of row a [`KanbanError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    Board,
    Column,
    Task,
    Subtask,
}

impl Entity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Board => "board",
            Self::Column => "column",
            Self::Task => "task",
            Self::Subtask => "subtask",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by board operations and the ordering engine.
///
/// Every failure is reported as a distinct outcome; nothing is coerced into a
/// partial success. Only [`KanbanError::Storage`] and
/// [`KanbanError::StalePlan`] are retryable, and only by recomputing the plan.
#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    /// The referenced row does not exist (or was deleted concurrently).
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    /// The move request is malformed or does not match current state.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// A required field is missing or blank.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// No account is registered under the given email.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The principal does not own the resolved board.
    #[error("unauthorized")]
    Unauthorized,

    /// A unique value (e.g. signup email) is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The groups a plan was computed against changed before it was applied.
    #[error("stale plan: group {group} changed since the move was planned")]
    StalePlan { group: i64 },

    /// Transient persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl KanbanError {
    #[must_use]
    pub const fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { entity, .. } => match entity {
                Entity::User => ErrorCode::UnknownUser,
                Entity::Board => ErrorCode::BoardNotFound,
                Entity::Column => ErrorCode::ColumnNotFound,
                Entity::Task => ErrorCode::TaskNotFound,
                Entity::Subtask => ErrorCode::SubtaskNotFound,
            },
            Self::UnknownUser(_) => ErrorCode::UnknownUser,
            Self::InvalidMove(_) => ErrorCode::InvalidMove,
            Self::Invalid(_) => ErrorCode::InvalidInput,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Conflict(_) => ErrorCode::DuplicateEmail,
            Self::StalePlan { .. } => ErrorCode::StalePlan,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Optional remediation hint for operators and clients.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Whether the caller may retry after re-planning against fresh state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::StalePlan { .. })
    }
}

/// Convenience alias for results of board operations.
pub type KanbanResult<T> = Result<T, KanbanError>;

pub mod board;
pub mod column;
pub mod completions;
pub mod init;
pub mod signup;
pub mod subtask;
pub mod task;
pub mod verify;

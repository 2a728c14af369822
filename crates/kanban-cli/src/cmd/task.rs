use anyhow::Result;
use clap::{Args, Subcommand};
use kanban_core::model::{ColumnId, TaskId, TaskPatch};
use kanban_core::{MoveRequest, Session};

use crate::context::Context;
use crate::output::{render_item, render_success};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    #[command(
        about = "Add a task at the bottom of a column",
        after_help = "EXAMPLES:\n    kanban task add 2 \"Write release notes\"\n\n    # With a description and subtasks\n    kanban task add 2 \"Ship v1\" --description \"Cut the tag\" --subtask Changelog --subtask Tag"
    )]
    Add(AddTaskArgs),

    #[command(
        about = "Show a task with its subtasks",
        after_help = "EXAMPLES:\n    kanban task show 7\n    kanban task show 7 --json"
    )]
    Show(TaskIdArg),

    #[command(
        about = "Edit a task's title or description",
        after_help = "EXAMPLES:\n    kanban task edit 7 --title \"Ship v1.0\"\n    kanban task edit 7 --description \"\""
    )]
    Edit(EditTaskArgs),

    #[command(
        about = "Move a task within or across columns",
        long_about = "Move a task to a zero-based index in a column of the same board. \
                      The task's current column and index are used as the source unless \
                      --from/--from-index are given; a stale source index is rejected. \
                      Indices past the end place the task last.",
        after_help = "EXAMPLES:\n    # Move task 7 to the top of column 3\n    kanban task move 7 --to 3 --index 0\n\n    # Reorder within its column, asserting where it is now\n    kanban task move 7 --to 2 --index 4 --from 2 --from-index 1"
    )]
    Move(MoveTaskArgs),

    #[command(
        about = "Delete a task and its subtasks",
        after_help = "EXAMPLES:\n    kanban task delete 7"
    )]
    Delete(TaskIdArg),
}

#[derive(Args, Debug)]
pub struct AddTaskArgs {
    /// Column id.
    pub column: ColumnId,

    /// Task title.
    pub title: String,

    /// Task description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Subtask title (repeatable).
    #[arg(long = "subtask", value_name = "TITLE")]
    pub subtasks: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TaskIdArg {
    /// Task id.
    pub id: TaskId,
}

#[derive(Args, Debug)]
pub struct EditTaskArgs {
    /// Task id.
    pub id: TaskId,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct MoveTaskArgs {
    /// Task id.
    pub id: TaskId,

    /// Destination column id.
    #[arg(long = "to", value_name = "COLUMN")]
    pub dest: ColumnId,

    /// Destination index (zero-based).
    #[arg(long, allow_negative_numbers = true)]
    pub index: i64,

    /// Source column id the task is expected to be in.
    #[arg(long = "from", value_name = "COLUMN")]
    pub source: Option<ColumnId>,

    /// Index the task is expected to hold in the source column.
    #[arg(long, allow_negative_numbers = true)]
    pub from_index: Option<i64>,
}

/// Execute a `kanban task` subcommand.
///
/// # Errors
///
/// Returns an error if the store is missing, the acting user is unknown, or
/// the operation is rejected.
pub fn run_task(command: &TaskCommand, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let session = ctx.session(&conn)?;

    match command {
        TaskCommand::Add(args) => {
            let task = session
                .create_task(args.column, &args.title, &args.description, &args.subtasks)
                .map_err(|err| ctx.fail(err))?;
            render_item(&task, ctx.output)
        }
        TaskCommand::Show(args) => {
            let task = session.get_task(args.id).map_err(|err| ctx.fail(err))?;
            render_item(&task, ctx.output)
        }
        TaskCommand::Edit(args) => {
            if args.title.is_none() && args.description.is_none() {
                anyhow::bail!("nothing to edit: pass --title and/or --description");
            }
            let patch = TaskPatch {
                title: args.title.clone(),
                description: args.description.clone(),
                subtasks: None,
            };
            let task = session
                .update_task(args.id, &patch)
                .map_err(|err| ctx.fail(err))?;
            render_item(&task, ctx.output)
        }
        TaskCommand::Move(args) => {
            let request = move_request(&session, args).map_err(|err| ctx.fail(err))?;
            session.move_task(&request).map_err(|err| ctx.fail(err))?;
            let task = session.get_task(args.id).map_err(|err| ctx.fail(err))?;
            render_item(&task, ctx.output)
        }
        TaskCommand::Delete(args) => {
            session.delete_task(args.id).map_err(|err| ctx.fail(err))?;
            render_success(ctx.output, &format!("Deleted task #{}", args.id))
        }
    }
}

/// Fill in the source side of a move from the task's current placement.
fn move_request(
    session: &Session<'_>,
    args: &MoveTaskArgs,
) -> kanban_core::KanbanResult<MoveRequest<kanban_core::TaskLane>> {
    let (source, source_index) = match (args.source, args.from_index) {
        (Some(source), Some(index)) => (source, index),
        (source, index) => {
            let current = session.get_task(args.id)?.task;
            (
                source.unwrap_or(current.column_id),
                index.unwrap_or(current.position),
            )
        }
    };
    MoveRequest::from_raw(
        args.id,
        source,
        args.dest,
        Some(source_index),
        Some(args.index),
    )
}

use anyhow::Result;
use clap::{Args, Subcommand};
use kanban_core::model::{SubtaskId, TaskId};

use crate::context::Context;
use crate::output::{render_item, render_success};

#[derive(Subcommand, Debug)]
pub enum SubtaskCommand {
    #[command(
        about = "Add a subtask to a task",
        after_help = "EXAMPLES:\n    kanban subtask add 7 \"Draft changelog\""
    )]
    Add(AddSubtaskArgs),

    #[command(
        about = "Flip or set a subtask's completion",
        after_help = "EXAMPLES:\n    # Flip\n    kanban subtask toggle 12\n\n    # Force a state\n    kanban subtask toggle 12 --done\n    kanban subtask toggle 12 --undone"
    )]
    Toggle(ToggleSubtaskArgs),

    #[command(
        about = "Rename a subtask",
        after_help = "EXAMPLES:\n    kanban subtask rename 12 \"Draft and review changelog\""
    )]
    Rename(RenameSubtaskArgs),

    #[command(about = "Delete a subtask", after_help = "EXAMPLES:\n    kanban subtask delete 12")]
    Delete(SubtaskIdArg),
}

#[derive(Args, Debug)]
pub struct AddSubtaskArgs {
    /// Task id.
    pub task: TaskId,

    /// Subtask title.
    pub title: String,
}

#[derive(Args, Debug)]
pub struct ToggleSubtaskArgs {
    /// Subtask id.
    pub id: SubtaskId,

    /// Mark completed.
    #[arg(long, conflicts_with = "undone")]
    pub done: bool,

    /// Mark not completed.
    #[arg(long)]
    pub undone: bool,
}

impl ToggleSubtaskArgs {
    /// The explicitly requested state, if any.
    const fn target(&self) -> Option<bool> {
        if self.done {
            Some(true)
        } else if self.undone {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Args, Debug)]
pub struct RenameSubtaskArgs {
    /// Subtask id.
    pub id: SubtaskId,

    /// New title.
    pub title: String,
}

#[derive(Args, Debug)]
pub struct SubtaskIdArg {
    /// Subtask id.
    pub id: SubtaskId,
}

/// Execute a `kanban subtask` subcommand.
///
/// # Errors
///
/// Returns an error if the store is missing, the acting user is unknown, or
/// the operation is rejected.
pub fn run_subtask(command: &SubtaskCommand, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let session = ctx.session(&conn)?;

    match command {
        SubtaskCommand::Add(args) => {
            let subtask = session
                .add_subtask(args.task, &args.title)
                .map_err(|err| ctx.fail(err))?;
            render_item(&subtask, ctx.output)
        }
        SubtaskCommand::Toggle(args) => {
            let completed = match args.target() {
                Some(state) => state,
                None => {
                    !session
                        .get_subtask(args.id)
                        .map_err(|err| ctx.fail(err))?
                        .is_completed
                }
            };
            let subtask = session
                .update_subtask(args.id, None, Some(completed))
                .map_err(|err| ctx.fail(err))?;
            render_item(&subtask, ctx.output)
        }
        SubtaskCommand::Rename(args) => {
            let subtask = session
                .update_subtask(args.id, Some(&args.title), None)
                .map_err(|err| ctx.fail(err))?;
            render_item(&subtask, ctx.output)
        }
        SubtaskCommand::Delete(args) => {
            session.delete_subtask(args.id).map_err(|err| ctx.fail(err))?;
            render_success(ctx.output, &format!("Deleted subtask #{}", args.id))
        }
    }
}

use anyhow::Result;
use clap::{Args, Subcommand};
use kanban_core::model::{BoardId, ColumnId};

use crate::context::Context;
use crate::output::{render_item, render_success};

#[derive(Subcommand, Debug)]
pub enum ColumnCommand {
    #[command(
        about = "Append a column to a board",
        after_help = "EXAMPLES:\n    kanban column add 1 Review"
    )]
    Add(AddColumnArgs),

    #[command(
        about = "Rename a column",
        after_help = "EXAMPLES:\n    kanban column rename 4 \"In Review\""
    )]
    Rename(RenameColumnArgs),

    #[command(
        about = "Move a column to a new index on its board",
        long_about = "Move a column to a zero-based index. Indices past the end place \
                      the column last; the other columns shift to stay contiguous.",
        after_help = "EXAMPLES:\n    # Make column 4 the first column\n    kanban column move 4 0"
    )]
    Move(MoveColumnArgs),

    #[command(
        about = "Delete a column and its tasks",
        after_help = "EXAMPLES:\n    kanban column delete 4"
    )]
    Delete(ColumnIdArg),
}

#[derive(Args, Debug)]
pub struct AddColumnArgs {
    /// Board id.
    pub board: BoardId,

    /// Column name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RenameColumnArgs {
    /// Column id.
    pub id: ColumnId,

    /// New column name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct MoveColumnArgs {
    /// Column id.
    pub id: ColumnId,

    /// Destination index (zero-based).
    pub index: usize,
}

#[derive(Args, Debug)]
pub struct ColumnIdArg {
    /// Column id.
    pub id: ColumnId,
}

/// Execute a `kanban column` subcommand.
///
/// # Errors
///
/// Returns an error if the store is missing, the acting user is unknown, or
/// the operation is rejected.
pub fn run_column(command: &ColumnCommand, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let session = ctx.session(&conn)?;

    match command {
        ColumnCommand::Add(args) => {
            let column = session
                .create_column(args.board, &args.name)
                .map_err(|err| ctx.fail(err))?;
            render_item(&column, ctx.output)
        }
        ColumnCommand::Rename(args) => {
            let column = session
                .rename_column(args.id, &args.name)
                .map_err(|err| ctx.fail(err))?;
            render_item(&column, ctx.output)
        }
        ColumnCommand::Move(args) => {
            session
                .move_column(args.id, args.index)
                .map_err(|err| ctx.fail(err))?;
            render_success(
                ctx.output,
                &format!("Moved column #{} to index {}", args.id, args.index),
            )
        }
        ColumnCommand::Delete(args) => {
            session.delete_column(args.id).map_err(|err| ctx.fail(err))?;
            render_success(ctx.output, &format!("Deleted column #{}", args.id))
        }
    }
}

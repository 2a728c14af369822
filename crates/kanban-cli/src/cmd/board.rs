use anyhow::Result;
use clap::{Args, Subcommand};
use kanban_core::model::{BoardId, ColumnId, ColumnSpec};

use crate::context::Context;
use crate::output::{render_list, render_success};
use crate::render::render_board;

#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    #[command(
        about = "List your boards",
        after_help = "EXAMPLES:\n    kanban board list\n    kanban board list --json"
    )]
    List,

    #[command(
        about = "Create a board",
        after_help = "EXAMPLES:\n    # Board with three columns\n    kanban board create Roadmap --column Now --column Next --column Later"
    )]
    Create(CreateBoardArgs),

    #[command(
        about = "Show a board with its columns and tasks",
        after_help = "EXAMPLES:\n    kanban board show 1\n    kanban board show 1 --format text"
    )]
    Show(BoardIdArg),

    #[command(
        about = "Rename a board and optionally replace its column list",
        long_about = "Rename a board. With --column, the listed columns become the board's \
                      columns in that order: `ID:Name` keeps and renames an existing column, \
                      a bare `Name` creates one, and unlisted columns are deleted with their tasks.",
        after_help = "EXAMPLES:\n    # Rename only\n    kanban board rename 1 \"Q3 Roadmap\"\n\n    # Keep columns 2 and 1 (swapped), add a new one\n    kanban board rename 1 Roadmap --column 2:Doing --column 1:Todo --column Review"
    )]
    Rename(RenameBoardArgs),

    #[command(
        about = "Delete a board and everything on it",
        after_help = "EXAMPLES:\n    kanban board delete 1"
    )]
    Delete(BoardIdArg),
}

#[derive(Args, Debug)]
pub struct CreateBoardArgs {
    /// Board name.
    pub name: String,

    /// Column name, in display order (repeatable).
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,
}

#[derive(Args, Debug)]
pub struct BoardIdArg {
    /// Board id.
    pub id: BoardId,
}

#[derive(Args, Debug)]
pub struct RenameBoardArgs {
    /// Board id.
    pub id: BoardId,

    /// New board name.
    pub name: String,

    /// Replacement column list entry: `ID:Name` or `Name` (repeatable).
    #[arg(long = "column", value_name = "SPEC", value_parser = parse_column_spec)]
    pub columns: Vec<ColumnSpec>,
}

/// Parse `ID:Name` into an existing column spec and anything else into a new
/// column. A prefix that is not an integer is part of the name.
fn parse_column_spec(raw: &str) -> Result<ColumnSpec, String> {
    let existing = raw
        .split_once(':')
        .and_then(|(id, name)| id.trim().parse::<i64>().ok().map(|id| (id, name)));
    if let Some((id, name)) = existing {
        return Ok(ColumnSpec::existing(ColumnId(id), name));
    }
    if raw.trim().is_empty() {
        return Err("column name must not be empty".to_string());
    }
    Ok(ColumnSpec::new(raw))
}

/// Execute a `kanban board` subcommand.
///
/// # Errors
///
/// Returns an error if the store is missing, the acting user is unknown, or
/// the operation is rejected.
pub fn run_board(command: &BoardCommand, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let session = ctx.session(&conn)?;

    match command {
        BoardCommand::List => {
            let boards = session.list_boards().map_err(|err| ctx.fail(err))?;
            if boards.is_empty() && !ctx.output.is_json() {
                if !ctx.quiet {
                    println!("No boards yet. Create one with `kanban board create <NAME>`.");
                }
                return Ok(());
            }
            render_list(&boards, ctx.output)
        }
        BoardCommand::Create(args) => {
            let board = session
                .create_board(&args.name, &args.columns)
                .map_err(|err| ctx.fail(err))?;
            render_board(&board, ctx.output)
        }
        BoardCommand::Show(args) => {
            let board = session.get_board(args.id).map_err(|err| ctx.fail(err))?;
            render_board(&board, ctx.output)
        }
        BoardCommand::Rename(args) => {
            let columns = (!args.columns.is_empty()).then_some(args.columns.as_slice());
            let board = session
                .update_board(args.id, &args.name, columns)
                .map_err(|err| ctx.fail(err))?;
            render_board(&board, ctx.output)
        }
        BoardCommand::Delete(args) => {
            session.delete_board(args.id).map_err(|err| ctx.fail(err))?;
            render_success(ctx.output, &format!("Deleted board #{}", args.id))
        }
    }
}

use anyhow::Result;
use clap::Args;
use kanban_core::accounts::{Account, signup};
use std::io::Write;

use crate::context::{Context, USER_ENV};
use crate::output::render;
use crate::render::write_board_pretty;

#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Display name.
    #[arg(long)]
    pub name: String,

    /// Email address; must be unique (case-insensitive).
    #[arg(long)]
    pub email: String,
}

/// Execute `kanban signup`: register a user and seed their first board.
///
/// # Errors
///
/// Returns an error if the store is missing, the email is taken, or the
/// input is blank.
pub fn run_signup(args: &SignupArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let account = signup(&conn, &ctx.config.project.signup, &args.name, &args.email)
        .map_err(|err| ctx.fail(err))?;

    render(ctx.output, &account, |account: &Account, w| {
        writeln!(
            w,
            "✓ Registered {} <{}> (user #{})",
            account.user.name, account.user.email, account.user.id
        )?;
        writeln!(w)?;
        write_board_pretty(&account.board, w)?;
        if !ctx.quiet {
            writeln!(w)?;
            writeln!(w, "Act as this user with:")?;
            writeln!(w, "  export {USER_ENV}={}", account.user.email)?;
        }
        Ok(())
    })
}

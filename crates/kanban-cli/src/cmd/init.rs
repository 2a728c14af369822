use anyhow::{Context as _, Result};
use clap::Args;
use kanban_core::config::{KANBAN_DIR, store_path};
use kanban_core::db::{migrations, open_store};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::context::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` even if `.kanban/` already exists. The store
    /// itself is never wiped.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[signup]\n\
    default_board = \"My First Board\"\n\
    default_columns = [\"TODO\", \"DOING\", \"DONE\"]\n\
    \n\
    [store]\n\
    busy_timeout_ms = 5000\n";

const GITIGNORE: &str = "kanban.db\nkanban.db-wal\nkanban.db-shm\n";

#[derive(Debug, Serialize)]
struct InitReport {
    store: String,
    config: String,
    schema_version: u32,
}

/// Execute `kanban init`. Creates the project skeleton:
///
/// ```text
/// .kanban/
///   kanban.db      (SQLite store, migrated to the latest schema)
///   config.toml    (default project config template)
///   .gitignore     (store and WAL files)
/// ```
///
/// # Errors
///
/// Returns an error if `.kanban/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, ctx: &Context) -> Result<()> {
    let kanban_dir = ctx.root.join(KANBAN_DIR);

    if kanban_dir.exists() && !args.force {
        anyhow::bail!(".kanban/ already exists. Use `kanban init --force` to rewrite its config.");
    }

    std::fs::create_dir_all(&kanban_dir)
        .with_context(|| format!("Failed to create {}", kanban_dir.display()))?;

    let config_path = kanban_dir.join("config.toml");
    write_file(&config_path, CONFIG_TOML)?;
    write_file(&kanban_dir.join(".gitignore"), GITIGNORE)?;

    let db_path = store_path(&ctx.root);
    let conn = open_store(&db_path, ctx.config.project.store.busy_timeout())?;
    let schema_version = migrations::current_schema_version(&conn)?;

    let report = InitReport {
        store: db_path.display().to_string(),
        config: config_path.display().to_string(),
        schema_version,
    };
    render(ctx.output, &report, |report, w| {
        writeln!(w, "✓ Initialized .kanban/ board store.")?;
        writeln!(w)?;
        writeln!(w, "  Store:  {} (schema v{})", report.store, report.schema_version)?;
        writeln!(w, "  Config: {}", report.config)?;
        if !ctx.quiet {
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  kanban signup --name \"Your Name\" --email you@example.com")?;
            writeln!(w, "  export KANBAN_USER=you@example.com")?;
            writeln!(w, "  kanban board list")?;
        }
        Ok(())
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

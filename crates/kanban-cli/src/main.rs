#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;
mod render;

use clap::{CommandFactory, Parser, Subcommand};
use context::{Context, Reported};
use kanban_core::config::resolve_config;
use output::{CliError, OutputMode, render_error};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kanban: boards, columns and tasks with stable ordering",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as the user with this email (overrides KANBAN_USER).
    #[arg(long, global = true, value_name = "EMAIL")]
    user: Option<String>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// The output format requested on the command line, if any.
    fn format_flag(&self) -> Option<&'static str> {
        if self.json {
            Some(OutputMode::Json.as_str())
        } else {
            self.format.map(OutputMode::as_str)
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a board store",
        long_about = "Create .kanban/ with a SQLite store and a default config in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    kanban init\n\n    # Rewrite the config template\n    kanban init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Register a user",
        long_about = "Register a user and create their first board with the configured default columns.",
        after_help = "EXAMPLES:\n    kanban signup --name \"Ada Lovelace\" --email ada@example.com\n\n    # Emit machine-readable output\n    kanban signup --name Ada --email ada@example.com --json"
    )]
    Signup(cmd::signup::SignupArgs),

    #[command(next_help_heading = "Boards", about = "Manage boards")]
    Board {
        #[command(subcommand)]
        command: cmd::board::BoardCommand,
    },

    #[command(next_help_heading = "Boards", about = "Manage columns")]
    Column {
        #[command(subcommand)]
        command: cmd::column::ColumnCommand,
    },

    #[command(next_help_heading = "Tasks", about = "Manage and move tasks")]
    Task {
        #[command(subcommand)]
        command: cmd::task::TaskCommand,
    },

    #[command(next_help_heading = "Tasks", about = "Manage subtasks")]
    Subtask {
        #[command(subcommand)]
        command: cmd::subtask::SubtaskCommand,
    },

    #[command(
        next_help_heading = "Store Maintenance",
        about = "Check that positions are contiguous",
        long_about = "Check that every board's columns and every column's tasks hold positions 0..n.",
        after_help = "EXAMPLES:\n    kanban verify\n    kanban verify --json"
    )]
    Verify,

    #[command(
        next_help_heading = "Store Maintenance",
        about = "Renumber non-contiguous positions",
        long_about = "Renumber any group whose positions have gaps or duplicates, keeping its current order.",
        after_help = "EXAMPLES:\n    kanban repair"
    )]
    Repair,

    #[command(
        next_help_heading = "Store Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    kanban completions bash\n    kanban completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KANBAN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "kanban=debug,info"
        } else {
            "kanban=info,warn"
        })
    });

    let format = env::var("KANBAN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        debug!("verbose mode enabled");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is::<Reported>() => ExitCode::FAILURE,
        Err(err) => {
            let mode = cli
                .format_flag()
                .map_or(OutputMode::Pretty, OutputMode::from_resolved);
            if render_error(mode, &CliError::new(format!("{err:#}"))).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let root = env::current_dir()?;
    let config = resolve_config(&root, cli.format_flag())?;
    let ctx = Context::new(root, config, cli.user.clone(), cli.quiet);

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Signup(args) => cmd::signup::run_signup(args, &ctx),
        Commands::Board { command } => cmd::board::run_board(command, &ctx),
        Commands::Column { command } => cmd::column::run_column(command, &ctx),
        Commands::Task { command } => cmd::task::run_task(command, &ctx),
        Commands::Subtask { command } => cmd::subtask::run_subtask(command, &ctx),
        Commands::Verify => cmd::verify::run_verify(&ctx),
        Commands::Repair => cmd::verify::run_repair(&ctx),
        Commands::Completions(_) => Ok(()),
    }
}

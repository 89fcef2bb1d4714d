mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::slice::SliceSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docket",
    about = "Work-item document manager — validate, fix, and track sliced tasks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .docket/ or .git/)
    #[arg(long, global = true, env = "DOCKET_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize docket in the current project
    Init,

    /// Create a work item from a template
    New {
        /// Template kind (task, bug, feature, or a custom template)
        kind: String,
        #[arg(required = true)]
        title: Vec<String>,
        /// Initial status (default: first configured status)
        #[arg(long)]
        status: Option<String>,
    },

    /// List work items
    List {
        /// Only items in this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Print one work item
    Show { id: String },

    /// Validate every work item; non-zero exit when findings remain
    Validate {
        /// Also flag frontmatter fields absent from the schema
        #[arg(long)]
        strict: bool,
        /// Apply safe automatic fixes before validating
        #[arg(long)]
        fix: bool,
    },

    /// Move a work item to another status
    Move { id: String, status: String },

    /// Manage slices and tasks
    Slice {
        #[command(subcommand)]
        subcommand: SliceSubcommand,
    },

    /// Move a work item into the archive
    Archive { id: String },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::New {
            kind,
            title,
            status,
        } => cmd::new::run(&root, &kind, &title.join(" "), status.as_deref(), cli.json),
        Commands::List { status } => cmd::list::run(&root, status.as_deref(), cli.json),
        Commands::Show { id } => cmd::show::run(&root, &id, cli.json),
        Commands::Validate { strict, fix } => cmd::validate::run(&root, strict, fix, cli.json),
        Commands::Move { id, status } => cmd::mv::run(&root, &id, &status, cli.json),
        Commands::Slice { subcommand } => cmd::slice::run(&root, subcommand, cli.json),
        Commands::Archive { id } => cmd::archive::run(&root, &id, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, migrate::MigrateArgs, task::TaskSubcommand,
    validate::ValidateArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vfq",
    about = "Priority task queue persisted as TASK_QUEUE.vf.json, with format migration and root-id validation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .vfq/ or .git/)
    #[arg(long, global = true, env = "VFQ_ROOT")]
    root: Option<PathBuf>,

    /// Directory holding the queue document, relative to the root
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the queue document, name registry and config if missing
    Init,

    /// Add, pop and finish tasks
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Show the queue document and counters
    State,

    /// Zero the processed / failed counters
    ResetCounters,

    /// Convert the queue document between formats
    Migrate(MigrateArgs),

    /// Audit root_item_id values in every queue document under a path
    Validate(ValidateArgs),

    /// List queue documents under the root
    List,

    /// Inspect and validate .vfq/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let queue_dir = root::resolve_queue_dir(&root, cli.dir.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, &queue_dir, cli.json),
        Commands::Task { subcommand } => cmd::task::run(&root, &queue_dir, subcommand, cli.json),
        Commands::State => cmd::state::run(&root, &queue_dir, cli.json),
        Commands::ResetCounters => cmd::state::reset_counters(&root, &queue_dir, cli.json),
        Commands::Migrate(args) => cmd::migrate::run(&root, &queue_dir, args, cli.json),
        Commands::Validate(args) => cmd::validate::run(&root, args, cli.json),
        Commands::List => cmd::list::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

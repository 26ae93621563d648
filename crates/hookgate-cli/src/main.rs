mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hookgate", about = "Hook normalization and execution engine for coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one hook: read the event from stdin, write the decision to stdout
    Run {
        /// Routing token, e.g. "Claude.PreToolUse"
        token: String,

        /// Config file path (default ~/.hookgate/config.json5)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Execution log database path (overrides config)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List the registered routing tokens
    Routes {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Inspect the execution log for a session
    Log {
        /// Session identifier
        #[arg(short, long)]
        session: String,

        /// Restrict to one file path
        #[arg(short, long)]
        file: Option<String>,

        /// Maximum entries to show, newest first
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr: stdout is reserved for the protocol envelope
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token, config, db } => {
            let rt = tokio::runtime::Runtime::new()?;
            let code = rt.block_on(wiring::run_hook(&token, config.as_deref(), db))?;
            std::process::exit(code);
        }
        Commands::Routes { config } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(wiring::print_routes(config.as_deref()))?;
        }
        Commands::Log {
            session,
            file,
            limit,
            db,
            config,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(wiring::print_log(
                &session,
                file.as_deref(),
                limit,
                config.as_deref(),
                db,
            ))?;
        }
    }

    Ok(())
}

// src/main.rs
//! modvault - CLI entry point

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

mod commands;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "modvault")]
#[command(version)]
#[command(about = "Snapshot and restore node_modules as a single SQLite file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a node_modules tree into a snapshot database
    Pack {
        /// Tree to pack
        #[arg(short, long, default_value = "./node_modules")]
        source: String,

        /// Snapshot file to write
        #[arg(short, long, default_value = "./node_modules.db")]
        output: String,

        /// gzip level: 1 (fastest) to 9 (smallest)
        #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..=9))]
        compression: u32,

        /// Also record a hash of the sibling package-lock.json
        #[arg(long)]
        include_lockfile: bool,
    },

    /// Restore a node_modules tree from a snapshot database
    Unpack {
        /// Snapshot file to read
        #[arg(short, long, default_value = "./node_modules.db")]
        input: String,

        /// Directory to restore into
        #[arg(short, long, default_value = "./node_modules")]
        output: String,

        /// Remove an existing output directory first
        #[arg(short, long)]
        force: bool,
    },

    /// Compare a snapshot against the current node_modules tree
    Status {
        /// Snapshot file to compare
        #[arg(long, default_value = "./node_modules.db")]
        db: String,

        /// Tree to compare against
        #[arg(short = 'n', long, default_value = "./node_modules")]
        node_modules: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            source,
            output,
            compression,
            include_lockfile,
        } => commands::cmd_pack(&source, &output, compression, include_lockfile),

        Commands::Unpack {
            input,
            output,
            force,
        } => commands::cmd_unpack(&input, &output, force),

        Commands::Status { db, node_modules } => commands::cmd_status(&db, &node_modules),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "modvault", &mut io::stdout());
            Ok(())
        }
    }
}

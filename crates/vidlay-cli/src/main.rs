//! Vidlay CLI - authoring tools for the video widget
//!
//! Features:
//! - List the video tokens found in rich-text content
//! - Resolve a player configuration from its layers
//! - Convert SRT captions to WebVTT

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Vidlay CLI - Video widget toolkit
#[derive(Parser)]
#[command(name = "vidlay")]
#[command(version)]
#[command(about = "Inspect video tokens, resolve player configuration, convert captions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the video tokens in a content file
    Tokens {
        /// HTML or text file to scan
        file: PathBuf,
    },

    /// Resolve the configuration a player would mount with
    Resolve {
        /// Global defaults (JSON file or inline JSON)
        #[arg(short, long)]
        global: Option<String>,

        /// Caller override (JSON file or inline JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Inline token, e.g. '[[video src="a.mp4" sound="false"]]'
        #[arg(short, long)]
        token: Option<String>,

        /// Report the aspect ratio for the mobile breakpoint
        #[arg(long)]
        mobile: bool,

        /// Report the aspect ratio after activation
        #[arg(long)]
        activated: bool,
    },

    /// Convert an SRT caption file to WebVTT
    Srt2vtt {
        /// Input .srt file
        input: PathBuf,

        /// Output .vtt file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tokens { file } => {
            commands::tokens(&file, &cli.format)?;
        }
        Commands::Resolve { global, config, token, mobile, activated } => {
            let request = commands::ResolveRequest {
                global,
                caller: config,
                token,
                mobile,
                activated,
            };
            commands::resolve(&request, &cli.format)?;
        }
        Commands::Srt2vtt { input, output } => {
            commands::srt2vtt(&input, output.as_deref())?;
        }
    }

    Ok(())
}

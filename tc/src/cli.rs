//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TaskChat - conversational task scheduler
#[derive(Parser)]
#[command(
    name = "tc",
    about = "Turn free-text scheduling requests into confirmed calendar tasks",
    version,
    after_help = "Logs are written to: ~/.local/share/taskchat/logs/taskchat.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive chat session (default)
    Chat {
        /// User id the session belongs to
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Send a single message and print the reply
    Send {
        /// User id the message belongs to
        #[arg(short, long, default_value = "local")]
        user: String,

        /// The message text
        text: String,

        /// Print the full reply structure as JSON
        #[arg(long)]
        json: bool,
    },
}

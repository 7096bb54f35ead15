//! CLI argument parsing using clap

use clap::{Parser, Subcommand};

/// svcrun - host-managed service worker lifecycle
///
/// Run a long-lived worker loop that stops promptly when signaled
#[derive(Parser, Debug)]
#[command(name = "svcrun")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the worker in the foreground until Ctrl+C or completion
    Run {
        /// Configuration file to load (default: standard locations)
        #[arg(short, long)]
        config: Option<String>,

        /// Delay between iterations in milliseconds
        #[arg(short, long)]
        pace: Option<u64>,

        /// Stop on its own after this many iterations
        #[arg(short, long)]
        limit: Option<u64>,

        /// Arguments handed to the worker entry point
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Print a commented sample configuration file
    SampleConfig,
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        // Default to a foreground run with config-file settings
        Command::Run {
            config: None,
            pace: None,
            limit: None,
            args: Vec::new(),
        }
    }
}

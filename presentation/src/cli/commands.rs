//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable, colored output
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for hearth
#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(author, version, about = "In-process REST bridge for an embedded chat client")]
#[command(long_about = r#"
hearth serves the REST calls of an embedded chat client in process: requests
to registered routes never reach the network, chat files travel to the
native side as JSONL scratch files, and streamed completions are rebuilt
from native events as server-sent events.

This binary wires the bridge together and offers diagnostics on top of it.

Configuration files are loaded from (in priority order):
1. --config <path>              Explicit config file
2. ./hearth.toml                Project-level config
3. ~/.config/hearth/config.toml Global config
Environment variables prefixed with HEARTH_ override all files
(HEARTH_STREAMING__FLUSH_INTERVAL_MS=25).

Example:
  hearth routes
  hearth jsonl check ~/chats/Seraphina.jsonl
  hearth stream replay recorded-events.jsonl --source openrouter
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List the built-in routes in match order
    Routes,

    /// Inspect JSONL chat files
    #[command(subcommand)]
    Jsonl(JsonlCommand),

    /// Work with streamed completions
    #[command(subcommand)]
    Stream(StreamCommand),

    /// Issue one request through an intercepted realm
    Request {
        /// Request path or absolute URL
        path: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(short, long, value_name = "JSON")]
        data: Option<String>,
    },

    /// Show configuration sources and the effective configuration
    Config,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum JsonlCommand {
    /// Stream-decode a chat file and validate every record
    Check {
        file: PathBuf,
    },

    /// Write a chat file through a scratch file in bounded chunks
    Chunk {
        file: PathBuf,

        /// Upper bound on one write (defaults to transport.max_chunk_bytes)
        #[arg(long, value_name = "BYTES")]
        max_bytes: Option<usize>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum StreamCommand {
    /// Feed recorded native stream events through the bridge and print the
    /// resulting SSE frames
    Replay {
        /// JSONL file of native events ({"type": "chunk" | "error" | "done", ...})
        events: PathBuf,

        /// Completion source named in synthesized error frames
        #[arg(long, default_value = "openai")]
        source: String,
    },
}

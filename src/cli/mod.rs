//! CLI argument parsing

mod common;
mod context;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{defaults, env};

pub use common::{parse_endpoint_options, EndpointOptions, OutputFormat};
pub use context::{
    ContextAction, CreateContextArgs, EndpointArgs, ExportContextArgs, ImportContextArgs,
    InspectContextArgs, ListContextArgs, RemoveContextArgs, UpdateContextArgs, UseContextArgs,
};

/// Manage named connection contexts for container engines and Kubernetes
#[derive(Parser, Debug)]
#[command(name = "ctxctl")]
#[command(version)]
#[command(about = "Manage named connection contexts", long_about = None)]
pub struct Cli {
    /// Configuration directory (default: ~/.ctxctl)
    #[arg(long, global = true, env = env::CONFIG_DIR)]
    pub config_dir: Option<PathBuf>,

    /// Context to use for this invocation (overrides CTXCTL_CONTEXT and the current context)
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage contexts
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// List Kubernetes namespaces visible through the active engine endpoint
    Namespaces,
}

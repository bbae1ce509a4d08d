//! ctxctl - Main entry point

use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;
use std::process::ExitCode;

use ctxctl::config::store as store_config;
use ctxctl::{
    run_context_command, run_namespaces_command, Ambient, Cli, Command, CommandEnv, CtxError,
};

/// Config directory: --config-dir / CTXCTL_CONFIG, else ~/.ctxctl
fn resolve_config_dir(flag: Option<PathBuf>) -> Result<PathBuf, CtxError> {
    if let Some(dir) = flag.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(store_config::DIR_NAME))
        .ok_or_else(|| CtxError::Config("cannot determine the home directory".to_string()))
}

async fn run(cli: Cli) -> Result<(), CtxError> {
    let config_dir = resolve_config_dir(cli.config_dir)?;
    debug!("Using config directory {}", config_dir.display());
    let env = CommandEnv::new(&config_dir, Ambient::from_env(), cli.context);

    match &cli.command {
        Command::Context { action } => run_context_command(&env, action),
        Command::Namespaces => run_namespaces_command(&env).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    info!("Starting ctxctl v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", cli.command);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

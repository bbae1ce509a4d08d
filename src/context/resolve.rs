//! Context and orchestrator resolution from multiple sources

use log::debug;

use crate::config::{defaults, env};
use crate::error::Result;

use super::cli_config::CliConfig;
use super::models::Context;
use super::orchestrator::Orchestrator;
use super::store::ContextStore;

/// Connection settings taken from the process environment.
///
/// Captured once by the binary and passed down explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ambient {
    /// Active context override
    pub context: Option<String>,
    pub docker_host: Option<String>,
    pub stack_orchestrator: Option<String>,
    /// Kubeconfig search path
    pub kubeconfig: Option<String>,
}

impl Ambient {
    /// Snapshot of the relevant environment variables; empty values count as unset
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            context: var(env::CONTEXT),
            docker_host: var(env::DOCKER_HOST),
            stack_orchestrator: var(env::STACK_ORCHESTRATOR),
            kubeconfig: var(env::KUBECONFIG),
        }
    }

    /// Engine endpoint used when no context is active
    pub fn docker_host(&self) -> &str {
        self.docker_host.as_deref().unwrap_or(defaults::DOCKER_HOST)
    }
}

/// Resolve the active context name:
/// 1. --context CLI flag
/// 2. CTXCTL_CONTEXT env var
/// 3. currentContext from the config file
///
/// The reserved name `default` means no context.
pub fn resolve_active_context_name(
    cli_context: Option<&str>,
    ambient: &Ambient,
    config: &CliConfig,
) -> Option<String> {
    let name = if let Some(name) = cli_context.filter(|n| !n.is_empty()) {
        debug!("Using context from CLI flag: {}", name);
        name.to_string()
    } else if let Some(name) = &ambient.context {
        debug!("Using context from {} env var: {}", env::CONTEXT, name);
        name.clone()
    } else if let Some(name) = config.current_context.as_ref().filter(|n| !n.is_empty()) {
        debug!("Using context from config file: {}", name);
        name.clone()
    } else {
        return None;
    };

    if name == defaults::CONTEXT_NAME {
        None
    } else {
        Some(name)
    }
}

/// Load the active context; `None` means ambient settings apply.
/// A named context that does not exist is an error.
pub fn resolve_active_context(
    store: &ContextStore,
    cli_context: Option<&str>,
    ambient: &Ambient,
    config: &CliConfig,
) -> Result<Option<Context>> {
    match resolve_active_context_name(cli_context, ambient, config) {
        Some(name) => {
            let context = store.get_context_metadata(&name)?;
            debug!("Resolved context {:?}", name);
            Ok(Some(context))
        }
        None => Ok(None),
    }
}

/// Resolve the stack orchestrator: flag, context metadata,
/// DOCKER_STACK_ORCHESTRATOR, config file, else unset
pub fn resolve_stack_orchestrator(
    flag: Option<&str>,
    context: Option<&Context>,
    ambient: &Ambient,
    config: &CliConfig,
) -> Result<Orchestrator> {
    if let Some(value) = flag.filter(|v| !v.is_empty()) {
        return value.parse();
    }
    if let Some(context) = context {
        let orchestrator = context.metadata.stack_orchestrator;
        if !orchestrator.is_unset() {
            return Ok(orchestrator);
        }
    }
    if let Some(value) = &ambient.stack_orchestrator {
        return value.parse();
    }
    if let Some(value) = config.stack_orchestrator.as_deref().filter(|v| !v.is_empty()) {
        return value.parse();
    }
    Ok(Orchestrator::Unset)
}

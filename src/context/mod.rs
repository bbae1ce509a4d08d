//! Context management module
//!
//! Named contexts bundle the endpoints (container engine, Kubernetes) and
//! TLS material needed to reach one environment. The [`ContextStore`] owns
//! the on-disk layout; the CLI configuration file remembers which context
//! is current.

mod atomic;
mod cli_config;
mod commands;
mod layout;
mod models;
mod orchestrator;
mod registry;
mod resolve;
mod store;
mod tls;

pub use cli_config::{CliConfig, CliConfigFile, KubernetesConfig};
pub use commands::{run_context_action, run_context_command, CommandEnv, Streams};
pub use layout::{check_path_component, ContextId, Layout};
pub use models::{Context, ContextInfo};
pub use orchestrator::{validate_orchestrator, Orchestrator};
pub use registry::{DecodeFn, EndpointRegistry};
pub use resolve::{
    resolve_active_context, resolve_active_context_name, resolve_stack_orchestrator, Ambient,
};
pub use store::{validate_context_name, ContextStore};
pub use tls::{ContextTls, EndpointFiles};

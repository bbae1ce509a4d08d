//! ctxctl - Named connection contexts for container engines and Kubernetes
//!
//! A context remembers how to reach one environment: the container engine
//! endpoint, an optional Kubernetes endpoint and the TLS material for both.
//! Contexts live in a file-based store, can be exported to a tar bundle or
//! kubeconfig and imported on another machine.
//!
//! # Features
//!
//! - Atomic create, update and remove of contexts shared by concurrent CLI runs
//! - TLS material stored next to the metadata with owner-only permissions
//! - Export/import through files, stdout/stdin or an in-process pipe
//! - Strongly typed endpoint metadata decoded through an endpoint registry
//!
//! # Example
//!
//! ```bash
//! # Create a context for a remote engine
//! ctxctl context create prod --docker host=tcp://prod:2376,ca=ca.pem,cert=cert.pem,key=key.pem
//!
//! # Create a context from the current kubeconfig
//! ctxctl context create k8s --kubernetes from-current=true
//!
//! # Switch to it and list contexts
//! ctxctl context use prod
//! ctxctl context ls
//!
//! # Move a context to another machine
//! ctxctl context export prod - | ssh other ctxctl context import prod -
//! ```

pub mod bundle;
pub mod cli;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod kubeconfig;
pub mod stacks;
pub mod ui;

pub use bundle::{copy_context, export, import, ExportFormat};
pub use cli::{Cli, Command, ContextAction, OutputFormat};
pub use context::{
    run_context_command, Ambient, CliConfig, CliConfigFile, CommandEnv, Context, ContextStore,
    ContextTls, EndpointRegistry, Orchestrator,
};
pub use endpoint::{DockerEndpointMeta, EndpointMeta, KubernetesEndpointMeta, TlsData};
pub use error::{CtxError, Result};
pub use stacks::run_namespaces_command;

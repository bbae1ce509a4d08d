//! Context management CLI arguments

use clap::{Args, Parser, Subcommand};

use super::common::{parse_endpoint_options, EndpointOptions, OutputFormat};

/// Context subcommands
#[derive(Subcommand, Debug)]
pub enum ContextAction {
    /// Create a context
    Create(CreateContextArgs),

    /// Update a context
    Update(UpdateContextArgs),

    /// List contexts
    #[command(visible_alias = "list")]
    Ls(ListContextArgs),

    /// Display detailed information on one or more contexts
    Inspect(InspectContextArgs),

    /// Export a context to a tar bundle or kubeconfig file
    Export(ExportContextArgs),

    /// Import a context from a tar bundle
    Import(ImportContextArgs),

    /// Set the current context
    Use(UseContextArgs),

    /// Remove one or more contexts
    #[command(visible_alias = "remove")]
    Rm(RemoveContextArgs),
}

/// Settings shared by 'context create' and 'context update'
#[derive(Args, Debug, Clone, Default)]
pub struct EndpointArgs {
    /// Description of the context
    #[arg(long)]
    pub description: Option<String>,

    /// Default orchestrator for stack operations (swarm, kubernetes, all)
    #[arg(long = "default-stack-orchestrator")]
    pub default_stack_orchestrator: Option<String>,

    /// Engine endpoint: host, ca, cert, key, skip-tls-verify, from
    #[arg(long, value_name = "KEY=VALUE,...", value_parser = parse_endpoint_options)]
    pub docker: Option<EndpointOptions>,

    /// Kubernetes endpoint: config-file ("-" reads stdin), context-override,
    /// namespace-override, from-current, from
    #[arg(long, value_name = "KEY=VALUE,...", value_parser = parse_endpoint_options)]
    pub kubernetes: Option<EndpointOptions>,
}

/// Arguments for 'context create' subcommand
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
        ctxctl context create prod --docker host=tcp://prod:2376,ca=ca.pem,cert=cert.pem,key=key.pem\n  \
        ctxctl context create k8s --kubernetes from-current=true --default-stack-orchestrator kubernetes\n  \
        ctxctl context create copy --from prod")]
pub struct CreateContextArgs {
    /// Context name
    pub name: String,

    #[command(flatten)]
    pub endpoints: EndpointArgs,

    /// Create the context from an existing context
    #[arg(long, conflicts_with_all = ["docker", "kubernetes"])]
    pub from: Option<String>,
}

/// Arguments for 'context update' subcommand
#[derive(Parser, Debug)]
pub struct UpdateContextArgs {
    /// Context name
    pub name: String,

    #[command(flatten)]
    pub endpoints: EndpointArgs,
}

/// Arguments for 'context ls' subcommand
#[derive(Parser, Debug)]
pub struct ListContextArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Only show context names
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

/// Arguments for 'context inspect' subcommand
#[derive(Parser, Debug)]
pub struct InspectContextArgs {
    /// Context names
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Arguments for 'context export' subcommand
#[derive(Parser, Debug)]
pub struct ExportContextArgs {
    /// Context name
    pub name: String,

    /// Output file; "-" or nothing writes to stdout
    pub dest: Option<String>,

    /// Export the Kubernetes endpoint as a kubeconfig file
    #[arg(long, default_value_t = false)]
    pub kubeconfig: bool,
}

/// Arguments for 'context import' subcommand
#[derive(Parser, Debug)]
pub struct ImportContextArgs {
    /// Name of the new context
    pub name: String,

    /// Bundle file; "-" reads from stdin
    pub source: String,
}

/// Arguments for 'context use' subcommand
#[derive(Parser, Debug)]
pub struct UseContextArgs {
    /// Context name to activate ("default" for ambient settings)
    pub name: String,
}

/// Arguments for 'context rm' subcommand
#[derive(Parser, Debug)]
pub struct RemoveContextArgs {
    /// Context names to remove
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Remove the context even if it is in use
    #[arg(short, long, default_value_t = false)]
    pub force: bool,
}

//! Context command handlers

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::bundle::{self, ExportFormat};
use crate::cli::{
    ContextAction, CreateContextArgs, EndpointArgs, EndpointOptions, ExportContextArgs,
    ImportContextArgs, InspectContextArgs, ListContextArgs, OutputFormat, RemoveContextArgs,
    UpdateContextArgs,
};
use crate::config::{defaults, store as store_config, tls as tls_files};
use crate::endpoint::{
    validate_docker_host, DockerEndpoint, DockerEndpointMeta, KubernetesEndpointMeta,
    DOCKER_ENDPOINT, KUBERNETES_ENDPOINT,
};
use crate::error::{CtxError, Result};
use crate::kubeconfig::{default_kubeconfig_path, KubeConfigLoader, KubeConfigReader};

use super::cli_config::{CliConfig, CliConfigFile};
use super::layout::{ContextId, Layout};
use super::models::Context;
use super::orchestrator::validate_orchestrator;
use super::resolve::{
    resolve_active_context, resolve_active_context_name, resolve_stack_orchestrator, Ambient,
};
use super::store::{validate_context_name, ContextStore};
use super::tls::{ContextTls, EndpointFiles};

/// Keys accepted in `--docker` and `--kubernetes` settings
mod keys {
    pub const FROM: &str = "from";
    pub const HOST: &str = "host";
    pub const CA: &str = "ca";
    pub const CERT: &str = "cert";
    pub const KEY: &str = "key";
    pub const SKIP_TLS_VERIFY: &str = "skip-tls-verify";
    pub const CONFIG_FILE: &str = "config-file";
    pub const CONTEXT_OVERRIDE: &str = "context-override";
    pub const NAMESPACE_OVERRIDE: &str = "namespace-override";
    pub const FROM_CURRENT: &str = "from-current";
}

const DOCKER_KEYS: &[&str] = &[
    keys::FROM,
    keys::HOST,
    keys::CA,
    keys::CERT,
    keys::KEY,
    keys::SKIP_TLS_VERIFY,
];

const KUBERNETES_KEYS: &[&str] = &[
    keys::FROM,
    keys::CONFIG_FILE,
    keys::CONTEXT_OVERRIDE,
    keys::NAMESPACE_OVERRIDE,
    keys::FROM_CURRENT,
];

const AMBIENT_DESCRIPTION: &str = "Current DOCKER_HOST based configuration";

/// Everything a command needs besides its arguments
#[derive(Debug, Clone)]
pub struct CommandEnv {
    pub store: ContextStore,
    pub config_file: CliConfigFile,
    pub ambient: Ambient,
    /// Value of the global `--context` flag
    pub context_flag: Option<String>,
}

/// Output streams of a command; stdout carries data, stderr carries status
pub struct Streams<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl CommandEnv {
    /// Store under `<config_dir>/contexts`, CLI config at `<config_dir>/config.json`
    pub fn new(config_dir: &Path, ambient: Ambient, context_flag: Option<String>) -> Self {
        Self {
            store: ContextStore::new(config_dir.join(store_config::CONTEXTS_DIR)),
            config_file: CliConfigFile::new(config_dir),
            ambient,
            context_flag,
        }
    }

    /// Engine endpoint of the active context, or the ambient DOCKER_HOST
    pub fn docker_endpoint(&self) -> Result<DockerEndpoint> {
        let config = self.config_file.load()?;
        let active = resolve_active_context(
            &self.store,
            self.context_flag.as_deref(),
            &self.ambient,
            &config,
        )?;
        match active {
            Some(context) => {
                let meta = context.docker_endpoint().ok_or_else(|| {
                    CtxError::Validation(format!(
                        "context {:?} has no docker endpoint",
                        context.name
                    ))
                })?;
                meta.with_tls_data(&self.store, &context.name)
            }
            None => Ok(DockerEndpoint {
                meta: DockerEndpointMeta::new(validate_docker_host(self.ambient.docker_host())?),
                tls: None,
            }),
        }
    }

    fn kubeconfig_path(&self) -> Result<PathBuf> {
        default_kubeconfig_path(self.ambient.kubeconfig.as_deref()).ok_or_else(|| {
            CtxError::Config("cannot determine the kubeconfig location".to_string())
        })
    }
}

fn output_err(e: io::Error) -> CtxError {
    CtxError::io("Failed to write output", e)
}

/// Dispatch context subcommands against the process stdio
pub fn run_context_command(env: &CommandEnv, action: &ContextAction) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();
    let mut streams = Streams {
        out: &mut out,
        err: &mut err,
    };
    run_context_action(env, action, io::stdin().lock(), &mut streams)
}

/// Dispatch context subcommands; `input` backs `import <name> -` and
/// `--kubernetes config-file=-`
pub fn run_context_action<R: Read>(
    env: &CommandEnv,
    action: &ContextAction,
    mut input: R,
    io: &mut Streams<'_>,
) -> Result<()> {
    match action {
        ContextAction::Create(args) => run_context_create(env, args, &mut input, io),
        ContextAction::Update(args) => run_context_update(env, args, &mut input, io),
        ContextAction::Ls(args) => run_context_list(env, args, io),
        ContextAction::Inspect(args) => run_context_inspect(env, args, io),
        ContextAction::Export(args) => run_context_export(env, args, io),
        ContextAction::Import(args) => run_context_import(env, args, input, io),
        ContextAction::Use(args) => run_context_use(env, &args.name, io),
        ContextAction::Rm(args) => run_context_remove(env, args, io),
    }
}

fn check_keys(kind: &str, options: &EndpointOptions, allowed: &[&str]) -> Result<()> {
    match options.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(CtxError::Validation(format!(
            "unrecognized config key for {} endpoint: {}",
            kind, key
        ))),
        None => Ok(()),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(CtxError::Validation(format!(
            "invalid value {:?} for {}: expected true or false",
            value, key
        ))),
    }
}

fn read_tls_file(path: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CtxError::NotFound(format!("file {} does not exist", path))
        } else {
            CtxError::io(format!("Failed to read {}", path), e)
        }
    })
}

/// `from` must stand alone in an endpoint setting
fn from_option<'a>(kind: &str, options: &'a EndpointOptions) -> Result<Option<&'a str>> {
    match options.get(keys::FROM) {
        Some(_) if options.len() > 1 => Err(CtxError::Validation(format!(
            "\"from\" cannot be combined with other {} endpoint settings",
            kind
        ))),
        Some(from) => Ok(Some(from.as_str())),
        None => Ok(None),
    }
}

fn docker_endpoint_from_options(
    env: &CommandEnv,
    options: Option<&EndpointOptions>,
) -> Result<(DockerEndpointMeta, EndpointFiles)> {
    let options = match options.filter(|o| !o.is_empty()) {
        Some(options) => options,
        None => {
            let host = validate_docker_host(env.ambient.docker_host())?;
            return Ok((DockerEndpointMeta::new(host), EndpointFiles::new()));
        }
    };
    check_keys("docker", options, DOCKER_KEYS)?;
    if let Some(from) = from_option("docker", options)? {
        return docker_endpoint_from_context(env, from);
    }

    let host = options
        .get(keys::HOST)
        .map(String::as_str)
        .unwrap_or_else(|| env.ambient.docker_host());
    let mut meta = DockerEndpointMeta::new(validate_docker_host(host)?);
    if let Some(value) = options.get(keys::SKIP_TLS_VERIFY) {
        meta.skip_tls_verify = parse_bool(keys::SKIP_TLS_VERIFY, value)?;
    }

    let mut files = EndpointFiles::new();
    for (key, file) in [
        (keys::CA, tls_files::CA_FILE),
        (keys::CERT, tls_files::CERT_FILE),
        (keys::KEY, tls_files::KEY_FILE),
    ] {
        if let Some(path) = options.get(key).filter(|p| !p.is_empty()) {
            files.insert(file.to_string(), read_tls_file(path)?);
        }
    }
    Ok((meta, files))
}

fn docker_endpoint_from_context(
    env: &CommandEnv,
    from: &str,
) -> Result<(DockerEndpointMeta, EndpointFiles)> {
    if from == defaults::CONTEXT_NAME {
        let host = validate_docker_host(env.ambient.docker_host())?;
        return Ok((DockerEndpointMeta::new(host), EndpointFiles::new()));
    }
    let context = env.store.get_context_metadata(from)?;
    let meta = context.docker_endpoint().ok_or_else(|| {
        CtxError::Validation(format!("context {:?} has no docker endpoint", from))
    })?;
    let endpoint = meta.with_tls_data(&env.store, from)?;
    let files = endpoint.tls.map(|t| t.to_files()).unwrap_or_default();
    Ok((endpoint.meta, files))
}

fn kubernetes_endpoint_from_options(
    env: &CommandEnv,
    options: &EndpointOptions,
    input: &mut dyn Read,
) -> Result<(KubernetesEndpointMeta, EndpointFiles)> {
    check_keys("kubernetes", options, KUBERNETES_KEYS)?;
    if let Some(from) = from_option("kubernetes", options)? {
        return kubernetes_endpoint_from_context(env, from);
    }

    let from_current = options
        .get(keys::FROM_CURRENT)
        .map(|v| parse_bool(keys::FROM_CURRENT, v))
        .transpose()?
        .unwrap_or(false);
    let loader = match options.get(keys::CONFIG_FILE) {
        Some(_) if from_current => {
            return Err(CtxError::Validation(format!(
                "{} and {} cannot be combined",
                keys::CONFIG_FILE,
                keys::FROM_CURRENT
            )))
        }
        Some(path) if path == "-" => KubeConfigLoader::from_reader(input)?,
        Some(path) => KubeConfigLoader::from_path(Path::new(path))?,
        None if from_current => KubeConfigLoader::from_path(&env.kubeconfig_path()?)?,
        None => {
            return Err(CtxError::Validation(format!(
                "kubernetes endpoint needs one of {}, {} or {}",
                keys::CONFIG_FILE,
                keys::FROM_CURRENT,
                keys::FROM
            )))
        }
    };
    let loader = loader
        .with_context_override(options.get(keys::CONTEXT_OVERRIDE).cloned())
        .with_namespace_override(options.get(keys::NAMESPACE_OVERRIDE).cloned());
    kubernetes_endpoint_from_kubeconfig(&loader)
}

fn kubernetes_endpoint_from_kubeconfig<R: KubeConfigReader + ?Sized>(
    reader: &R,
) -> Result<(KubernetesEndpointMeta, EndpointFiles)> {
    let (meta, tls) = KubernetesEndpointMeta::from_kubeconfig(reader)?;
    Ok((meta, tls.map(|t| t.to_files()).unwrap_or_default()))
}

fn kubernetes_endpoint_from_context(
    env: &CommandEnv,
    from: &str,
) -> Result<(KubernetesEndpointMeta, EndpointFiles)> {
    if from == defaults::CONTEXT_NAME {
        let loader = KubeConfigLoader::from_path(&env.kubeconfig_path()?)?;
        return kubernetes_endpoint_from_kubeconfig(&loader);
    }
    let context = env.store.get_context_metadata(from)?;
    let meta = context.kubernetes_endpoint().ok_or_else(|| {
        CtxError::Validation(format!("context {:?} has no kubernetes endpoint", from))
    })?;
    let endpoint = meta.with_tls_data(&env.store, from)?;
    let files = endpoint.tls.map(|t| t.to_files()).unwrap_or_default();
    Ok((endpoint.meta, files))
}

fn requested_kubernetes(endpoints: &EndpointArgs) -> Option<&EndpointOptions> {
    endpoints.kubernetes.as_ref().filter(|o| !o.is_empty())
}

/// Create a context from endpoint settings or from an existing context
fn run_context_create(
    env: &CommandEnv,
    args: &CreateContextArgs,
    input: &mut dyn Read,
    io: &mut Streams<'_>,
) -> Result<()> {
    validate_context_name(&args.name)?;
    if env.store.context_exists(&args.name)? {
        return Err(CtxError::AlreadyExists(format!(
            "context {:?} already exists",
            args.name
        )));
    }

    let context = match &args.from {
        Some(from) => create_from_existing(env, &args.name, from, &args.endpoints)?,
        None => create_from_endpoints(env, &args.name, &args.endpoints, input)?,
    };

    writeln!(io.out, "{}", context.name).map_err(output_err)?;
    writeln!(io.err, "Successfully created context {:?}", context.name).map_err(output_err)?;
    Ok(())
}

fn create_from_endpoints(
    env: &CommandEnv,
    name: &str,
    endpoints: &EndpointArgs,
    input: &mut dyn Read,
) -> Result<Context> {
    let (docker, docker_files) = docker_endpoint_from_options(env, endpoints.docker.as_ref())?;
    let kubernetes = requested_kubernetes(endpoints)
        .map(|options| kubernetes_endpoint_from_options(env, options, input))
        .transpose()?;
    let orchestrator = validate_orchestrator(
        endpoints.default_stack_orchestrator.as_deref().unwrap_or(""),
        kubernetes.is_some(),
    )?;

    let mut context = Context::new(name)
        .with_description(endpoints.description.clone().unwrap_or_default())
        .with_orchestrator(orchestrator)
        .with_endpoint(docker);
    let mut tls = ContextTls::new();
    if !docker_files.is_empty() {
        tls.set_endpoint(DOCKER_ENDPOINT, docker_files);
    }
    if let Some((meta, files)) = kubernetes {
        context.set_endpoint(meta);
        if !files.is_empty() {
            tls.set_endpoint(KUBERNETES_ENDPOINT, files);
        }
    }

    debug!("Creating context {:?} with {} endpoint(s)", name, context.endpoints.len());
    env.store.create_context(&context, Some(&tls))?;
    Ok(context)
}

fn create_from_existing(
    env: &CommandEnv,
    name: &str,
    from: &str,
    endpoints: &EndpointArgs,
) -> Result<Context> {
    let source = env.store.get_context_metadata(from)?;
    let orchestrator = endpoints
        .default_stack_orchestrator
        .as_deref()
        .map(|o| validate_orchestrator(o, source.kubernetes_endpoint().is_some()))
        .transpose()?;

    debug!("Copying context {:?} to {:?}", from, name);
    let mut context = bundle::copy_context(&env.store, from, name)?;
    if endpoints.description.is_some() || orchestrator.is_some() {
        if let Some(description) = &endpoints.description {
            context.metadata.description = description.clone();
        }
        if let Some(orchestrator) = orchestrator {
            context.metadata.stack_orchestrator = orchestrator;
        }
        env.store.create_or_update_context(&context, None)?;
    }
    Ok(context)
}

/// Merge new settings into an existing context
fn run_context_update(
    env: &CommandEnv,
    args: &UpdateContextArgs,
    input: &mut dyn Read,
    io: &mut Streams<'_>,
) -> Result<()> {
    validate_context_name(&args.name)?;
    let mut context = env.store.get_context_metadata(&args.name)?;
    let endpoints = &args.endpoints;
    let mut tls = ContextTls::new();

    if let Some(description) = &endpoints.description {
        context.metadata.description = description.clone();
    }
    if let Some(options) = endpoints.docker.as_ref().filter(|o| !o.is_empty()) {
        let (meta, files) = docker_endpoint_from_options(env, Some(options))?;
        context.set_endpoint(meta);
        tls.set_endpoint(DOCKER_ENDPOINT, files);
    }
    if let Some(options) = requested_kubernetes(endpoints) {
        let (meta, files) = kubernetes_endpoint_from_options(env, options, input)?;
        context.set_endpoint(meta);
        tls.set_endpoint(KUBERNETES_ENDPOINT, files);
    }

    let requested = endpoints
        .default_stack_orchestrator
        .as_deref()
        .unwrap_or_else(|| context.metadata.stack_orchestrator.as_str());
    context.metadata.stack_orchestrator =
        validate_orchestrator(requested, context.kubernetes_endpoint().is_some())?;

    env.store.create_or_update_context(&context, Some(&tls))?;
    writeln!(io.out, "{}", context.name).map_err(output_err)?;
    writeln!(io.err, "Successfully updated context {:?}", context.name).map_err(output_err)?;
    Ok(())
}

/// One line of `context ls`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ContextRow {
    name: String,
    current: bool,
    description: String,
    stack_orchestrator: String,
    docker_endpoint: String,
    kubernetes_endpoint: String,
}

fn kubernetes_label(host: &str, namespace: &str) -> String {
    format!("{} ({})", host, namespace)
}

fn context_rows(env: &CommandEnv, quiet: bool) -> Result<Vec<ContextRow>> {
    let config = env.config_file.load()?;
    let current = resolve_active_context_name(env.context_flag.as_deref(), &env.ambient, &config);

    let mut rows = Vec::new();
    if current.is_none() && !quiet {
        rows.push(ambient_row(env, &config));
    }
    for context in env.store.list_contexts()? {
        rows.push(ContextRow {
            current: current.as_deref() == Some(context.name.as_str()),
            description: context.metadata.description.clone(),
            stack_orchestrator: context.metadata.stack_orchestrator.display_value().to_string(),
            docker_endpoint: context
                .docker_endpoint()
                .map(|d| d.host.clone())
                .unwrap_or_default(),
            kubernetes_endpoint: context
                .kubernetes_endpoint()
                .map(|k| kubernetes_label(&k.host, &k.default_namespace))
                .unwrap_or_default(),
            name: context.name,
        });
    }
    Ok(rows)
}

/// Unnamed virtual row describing the settings used when no context is active
fn ambient_row(env: &CommandEnv, config: &CliConfig) -> ContextRow {
    let stack_orchestrator = resolve_stack_orchestrator(None, None, &env.ambient, config)
        .map(|o| o.display_value().to_string())
        .unwrap_or_default();
    let kubernetes = env.kubeconfig_path().and_then(|path| {
        let loader = KubeConfigLoader::from_path(&path)?;
        let client = loader.client_config()?;
        let (namespace, _) = loader.namespace()?;
        Ok(kubernetes_label(&client.host, &namespace))
    });
    let kubernetes_endpoint = kubernetes.unwrap_or_else(|e| {
        debug!("No ambient kubernetes endpoint: {}", e);
        String::new()
    });

    ContextRow {
        name: String::new(),
        current: true,
        description: AMBIENT_DESCRIPTION.to_string(),
        stack_orchestrator,
        docker_endpoint: env.ambient.docker_host().to_string(),
        kubernetes_endpoint,
    }
}

fn run_context_list(env: &CommandEnv, args: &ListContextArgs, io: &mut Streams<'_>) -> Result<()> {
    let rows = context_rows(env, args.quiet)?;

    if args.quiet {
        for row in &rows {
            writeln!(io.out, "{}", row.name).map_err(output_err)?;
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows)?;
            writeln!(io.out, "{}", json).map_err(output_err)?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("CURRENT"),
                    Cell::new("NAME"),
                    Cell::new("DESCRIPTION"),
                    Cell::new("DOCKER ENDPOINT"),
                    Cell::new("KUBERNETES ENDPOINT"),
                    Cell::new("ORCHESTRATOR"),
                ]);
            for row in &rows {
                table.add_row(vec![
                    Cell::new(if row.current { "*" } else { "" }),
                    Cell::new(&row.name),
                    Cell::new(&row.description),
                    Cell::new(&row.docker_endpoint),
                    Cell::new(&row.kubernetes_endpoint),
                    Cell::new(&row.stack_orchestrator),
                ]);
            }
            writeln!(io.out, "{table}").map_err(output_err)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StorageInfo {
    metadata_path: String,
    #[serde(rename = "TLSPath")]
    tls_path: String,
}

#[derive(Serialize)]
struct InspectEntry {
    #[serde(flatten)]
    context: Context,
    #[serde(rename = "TLSMaterial")]
    tls_material: BTreeMap<String, BTreeSet<String>>,
    #[serde(rename = "Storage")]
    storage: StorageInfo,
}

fn run_context_inspect(
    env: &CommandEnv,
    args: &InspectContextArgs,
    io: &mut Streams<'_>,
) -> Result<()> {
    let layout = Layout::new(env.store.root());
    let entries = args
        .names
        .iter()
        .map(|name| {
            let context = env.store.get_context_metadata(name)?;
            let id = ContextId::from_name(name);
            Ok(InspectEntry {
                tls_material: env.store.list_context_tls_files(name)?,
                storage: StorageInfo {
                    metadata_path: layout.meta_dir(&id).display().to_string(),
                    tls_path: layout.tls_dir(&id).display().to_string(),
                },
                context,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let json = serde_json::to_string_pretty(&entries)?;
    writeln!(io.out, "{}", json).map_err(output_err)?;
    Ok(())
}

fn run_context_export(
    env: &CommandEnv,
    args: &ExportContextArgs,
    io: &mut Streams<'_>,
) -> Result<()> {
    let format = if args.kubeconfig {
        ExportFormat::Kubeconfig
    } else {
        ExportFormat::Bundle
    };

    match args.dest.as_deref().filter(|d| *d != "-") {
        None => {
            bundle::export_as(&env.store, &args.name, format, &mut *io.out)?;
            io.out.flush().map_err(output_err)
        }
        Some(dest) => {
            bundle::export_to_path(&env.store, &args.name, format, Path::new(dest))?;
            writeln!(io.err, "Written file {:?}", dest).map_err(output_err)
        }
    }
}

fn run_context_import<R: Read>(
    env: &CommandEnv,
    args: &ImportContextArgs,
    input: R,
    io: &mut Streams<'_>,
) -> Result<()> {
    let context = if args.source == "-" {
        bundle::import(&env.store, &args.name, input)?
    } else {
        bundle::import_from_path(&env.store, &args.name, Path::new(&args.source))?
    };
    writeln!(io.out, "{}", context.name).map_err(output_err)?;
    writeln!(io.err, "Successfully imported context {:?}", context.name).map_err(output_err)?;
    Ok(())
}

/// Make `name` the current context; `default` returns to ambient settings
fn run_context_use(env: &CommandEnv, name: &str, io: &mut Streams<'_>) -> Result<()> {
    let mut config = env.config_file.load()?;
    if name == defaults::CONTEXT_NAME {
        config.current_context = None;
    } else {
        env.store.get_context_metadata(name)?;
        config.current_context = Some(name.to_string());
    }
    env.config_file.save(&config)?;

    writeln!(io.out, "{}", name).map_err(output_err)?;
    writeln!(io.err, "Current context is now {:?}", name).map_err(output_err)?;
    Ok(())
}

/// Remove every named context; failures are reported and the first is returned
fn run_context_remove(
    env: &CommandEnv,
    args: &RemoveContextArgs,
    io: &mut Streams<'_>,
) -> Result<()> {
    let mut config = env.config_file.load()?;
    let mut first_error: Option<CtxError> = None;

    for name in &args.names {
        match remove_one(env, &mut config, name, args.force) {
            Ok(()) => writeln!(io.out, "{}", name).map_err(output_err)?,
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => writeln!(io.err, "{}", e).map_err(output_err)?,
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn remove_one(env: &CommandEnv, config: &mut CliConfig, name: &str, force: bool) -> Result<()> {
    let is_current = config.current_context.as_deref() == Some(name);
    if is_current && !force {
        return Err(CtxError::Validation(format!(
            "context {:?} is in use, set -f flag to force remove",
            name
        )));
    }
    env.store.remove_context(name)?;
    if is_current {
        config.current_context = None;
        env.config_file.save(config)?;
    }
    Ok(())
}

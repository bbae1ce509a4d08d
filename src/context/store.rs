//! Context store: metadata and TLS material on disk

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{defaults, store as store_config};
use crate::endpoint::TlsSource;
use crate::error::{CtxError, Result};

use super::atomic::{remove_dir_if_exists, write_atomic};
use super::layout::{check_path_component, ContextId, Layout};
use super::models::Context;
use super::orchestrator::check_kubernetes_endpoint;
use super::registry::EndpointRegistry;
use super::tls::{ContextTls, EndpointFiles, TlsStore};

/// CRUD over named contexts rooted at one directory.
///
/// Every file write is temp-then-rename. There is no cross-process
/// locking: concurrent writers of the same context name race and the last
/// rename wins.
#[derive(Debug, Clone)]
pub struct ContextStore {
    layout: Layout,
    registry: EndpointRegistry,
    tls: TlsStore,
}

/// Reject empty and reserved context names
pub fn validate_context_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CtxError::InvalidName(
            "context name cannot be empty".to_string(),
        ));
    }
    if name == defaults::CONTEXT_NAME {
        return Err(CtxError::InvalidName(format!(
            "{:?} is a reserved context name",
            name
        )));
    }
    Ok(())
}

fn not_found(name: &str) -> CtxError {
    CtxError::NotFound(format!("context {:?} does not exist", name))
}

impl ContextStore {
    /// Store rooted at `root` with the built-in endpoint types
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, EndpointRegistry::default())
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: EndpointRegistry) -> Self {
        let layout = Layout::new(root);
        Self {
            tls: TlsStore::new(layout.clone()),
            layout,
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Create a context; fails with `AlreadyExists` if the name is taken
    pub fn create_context(&self, context: &Context, tls: Option<&ContextTls>) -> Result<()> {
        validate_context_name(&context.name)?;
        if self.context_exists(&context.name)? {
            return Err(CtxError::AlreadyExists(format!(
                "context {:?} already exists",
                context.name
            )));
        }
        self.create_or_update_context(context, tls)
    }

    /// Create a context or fully replace an existing one.
    ///
    /// Endpoints missing from `context` lose their TLS material. For
    /// endpoints present in `tls`, the stored file set is replaced by the
    /// given one; other endpoints keep their files. TLS material is written
    /// before the metadata, so a visible context always has its secrets.
    pub fn create_or_update_context(&self, context: &Context, tls: Option<&ContextTls>) -> Result<()> {
        validate_context_name(&context.name)?;
        self.validate_endpoints(context, tls)?;

        let id = ContextId::from_name(&context.name);
        match self.read_metadata(&id)? {
            Some(existing) => {
                for endpoint in existing.endpoints.keys() {
                    if !context.endpoints.contains_key(endpoint) {
                        self.tls.remove_endpoint(&id, endpoint)?;
                    }
                }
            }
            None => {
                // A previous generation of this name may have left secrets behind
                self.tls.remove_all(&id)?;
            }
        }

        if let Some(tls) = tls {
            for (endpoint, files) in &tls.endpoints {
                self.tls.reset_endpoint(&id, endpoint, files)?;
            }
        }

        let path = self.layout.meta_file(&id);
        write_atomic(&path, &context.to_json()?)?;
        info!("Saved context {:?}", context.name);
        Ok(())
    }

    fn validate_endpoints(&self, context: &Context, tls: Option<&ContextTls>) -> Result<()> {
        for (key, endpoint) in &context.endpoints {
            if key != endpoint.type_name() {
                return Err(CtxError::Validation(format!(
                    "endpoint key {:?} does not match endpoint type {:?}",
                    key,
                    endpoint.type_name()
                )));
            }
            if !self.registry.contains(key) {
                return Err(CtxError::Validation(format!(
                    "endpoint type {:?} is not registered",
                    key
                )));
            }
        }
        check_kubernetes_endpoint(
            context.metadata.stack_orchestrator,
            context.kubernetes_endpoint().is_some(),
        )?;

        if let Some(tls) = tls {
            for (endpoint, files) in &tls.endpoints {
                check_path_component("endpoint", endpoint)?;
                if !context.endpoints.contains_key(endpoint) {
                    return Err(CtxError::Validation(format!(
                        "TLS material given for endpoint {:?} which context {:?} does not have",
                        endpoint, context.name
                    )));
                }
                for file in files.keys() {
                    check_path_component("TLS file", file)?;
                }
            }
        }
        Ok(())
    }

    /// Metadata of a context; `NotFound` if absent
    pub fn get_context_metadata(&self, name: &str) -> Result<Context> {
        let id = ContextId::from_name(name);
        self.read_metadata(&id)?.ok_or_else(|| not_found(name))
    }

    pub fn context_exists(&self, name: &str) -> Result<bool> {
        let id = ContextId::from_name(name);
        Ok(self.read_metadata(&id)?.is_some())
    }

    fn read_metadata(&self, id: &ContextId) -> Result<Option<Context>> {
        let path = self.layout.meta_file(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CtxError::io(
                    format!("Failed to read context metadata {}", path.display()),
                    e,
                ))
            }
        };
        Context::from_json(&bytes, &self.registry)
            .map(Some)
            .map_err(|e| match e {
                CtxError::Decode(msg) => CtxError::Decode(format!("{}: {}", path.display(), msg)),
                other => other,
            })
    }

    /// All stored contexts, sorted by name
    pub fn list_contexts(&self) -> Result<Vec<Context>> {
        let meta_root = self.layout.meta_root();
        let entries = match fs::read_dir(&meta_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CtxError::io(
                    format!("Failed to list contexts in {}", meta_root.display()),
                    e,
                ))
            }
        };

        let mut contexts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                CtxError::io(format!("Failed to list contexts in {}", meta_root.display()), e)
            })?;
            let file_type = entry.file_type().map_err(|e| {
                CtxError::io(format!("Failed to stat {}", entry.path().display()), e)
            })?;
            if !file_type.is_dir() {
                continue;
            }
            let id_dir = entry.file_name().to_string_lossy().into_owned();
            // A context removed concurrently simply disappears from the listing
            let path = meta_root.join(&id_dir).join(store_config::META_FILE);
            match fs::read(&path) {
                Ok(bytes) => {
                    let ctx = Context::from_json(&bytes, &self.registry).map_err(|e| match e {
                        CtxError::Decode(msg) => {
                            CtxError::Decode(format!("{}: {}", path.display(), msg))
                        }
                        other => other,
                    })?;
                    contexts.push(ctx);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Skipping {} without metadata", id_dir);
                }
                Err(e) => {
                    return Err(CtxError::io(
                        format!("Failed to read context metadata {}", path.display()),
                        e,
                    ))
                }
            }
        }

        contexts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contexts)
    }

    /// Remove a context and all its TLS material.
    ///
    /// Unlinking the metadata file is the commit point: of several concurrent
    /// removals exactly one succeeds, the others see `NotFound`.
    pub fn remove_context(&self, name: &str) -> Result<()> {
        let id = ContextId::from_name(name);
        let meta_file = self.layout.meta_file(&id);

        match fs::remove_file(&meta_file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(name)),
            Err(e) => {
                return Err(CtxError::io(
                    format!("Failed to remove context metadata {}", meta_file.display()),
                    e,
                ))
            }
        }
        remove_dir_if_exists(&self.layout.meta_dir(&id))?;
        self.tls.remove_all(&id)?;
        info!("Removed context {:?}", name);
        Ok(())
    }

    /// TLS files of a context as endpoint -> file names
    pub fn list_context_tls_files(&self, name: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let id = ContextId::from_name(name);
        self.tls.list_files(&id)
    }

    pub fn get_context_tls_data(&self, name: &str, endpoint: &str, file: &str) -> Result<Vec<u8>> {
        let id = ContextId::from_name(name);
        self.tls.read(&id, endpoint, file)
    }

    /// Every TLS file of a context
    pub fn get_context_tls(&self, name: &str) -> Result<ContextTls> {
        let id = ContextId::from_name(name);
        self.tls.read_all(&id)
    }

    /// Replace the TLS file set of one endpoint of an existing context
    pub fn reset_context_tls_material(
        &self,
        name: &str,
        endpoint: &str,
        files: &EndpointFiles,
    ) -> Result<()> {
        let context = self.get_context_metadata(name)?;
        if !context.endpoints.contains_key(endpoint) {
            return Err(CtxError::Validation(format!(
                "context {:?} has no {:?} endpoint",
                name, endpoint
            )));
        }
        let id = ContextId::from_name(name);
        self.tls.reset_endpoint(&id, endpoint, files)
    }
}

impl TlsSource for ContextStore {
    fn list_tls_files(&self, context: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
        self.list_context_tls_files(context)
    }

    fn tls_data(&self, context: &str, endpoint: &str, file: &str) -> Result<Vec<u8>> {
        self.get_context_tls_data(context, endpoint, file)
    }
}

//! TLS material storage
//!
//! Secret blobs are stored one file per `(context, endpoint, file name)` under
//! `<root>/tls/<context-id>/<endpoint>/<file>`. Every write goes through
//! [`write_atomic`], so a reader never observes a partially written secret.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use crate::error::{CtxError, Result};

use super::atomic::{remove_dir_if_exists, write_atomic, TEMP_PREFIX};
use super::layout::{check_path_component, ContextId, Layout};

/// TLS files of one endpoint, keyed by file name
pub type EndpointFiles = BTreeMap<String, Vec<u8>>;

/// TLS files of a whole context, keyed by endpoint type name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextTls {
    pub endpoints: BTreeMap<String, EndpointFiles>,
}

impl ContextTls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, endpoint: &str, file: &str, data: Vec<u8>) {
        self.endpoints
            .entry(endpoint.to_string())
            .or_default()
            .insert(file.to_string(), data);
    }

    /// Replace all files of one endpoint
    pub fn set_endpoint(&mut self, endpoint: &str, files: EndpointFiles) {
        self.endpoints.insert(endpoint.to_string(), files);
    }

    pub fn get(&self, endpoint: &str, file: &str) -> Option<&[u8]> {
        self.endpoints
            .get(endpoint)
            .and_then(|files| files.get(file))
            .map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.values().all(BTreeMap::is_empty)
    }
}

/// File-backed TLS material manager
#[derive(Debug, Clone)]
pub struct TlsStore {
    layout: Layout,
}

impl TlsStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Write one file, replacing any previous version atomically
    pub fn save(&self, id: &ContextId, endpoint: &str, file: &str, data: &[u8]) -> Result<()> {
        check_path_component("endpoint", endpoint)?;
        check_path_component("TLS file", file)?;
        let path = self.layout.tls_file(id, endpoint, file);
        debug!("Saving TLS file {}", path.display());
        write_atomic(&path, data)
    }

    /// Read one file; a missing file is `NotFound`
    pub fn read(&self, id: &ContextId, endpoint: &str, file: &str) -> Result<Vec<u8>> {
        check_path_component("endpoint", endpoint)?;
        check_path_component("TLS file", file)?;
        let path = self.layout.tls_file(id, endpoint, file);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CtxError::NotFound(format!(
                    "TLS file {:?} for endpoint {:?} not found",
                    file, endpoint
                ))
            } else {
                CtxError::io(format!("Failed to read TLS file {}", path.display()), e)
            }
        })
    }

    /// Remove all TLS material of a context; absent material is not an error
    pub fn remove_all(&self, id: &ContextId) -> Result<()> {
        debug!("Removing TLS material for context id {}", id);
        remove_dir_if_exists(&self.layout.tls_dir(id))
    }

    /// Remove the TLS material of one endpoint
    pub fn remove_endpoint(&self, id: &ContextId, endpoint: &str) -> Result<()> {
        check_path_component("endpoint", endpoint)?;
        debug!("Removing TLS material of endpoint {} for context id {}", endpoint, id);
        remove_dir_if_exists(&self.layout.tls_endpoint_dir(id, endpoint))
    }

    /// List stored files as endpoint -> file names
    pub fn list_files(&self, id: &ContextId) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut result = BTreeMap::new();
        let tls_dir = self.layout.tls_dir(id);

        for endpoint in list_dir(&tls_dir, true)? {
            let files = list_dir(&self.layout.tls_endpoint_dir(id, &endpoint), false)?;
            if !files.is_empty() {
                result.insert(endpoint, files.into_iter().collect());
            }
        }
        Ok(result)
    }

    /// Read every stored file of a context
    pub fn read_all(&self, id: &ContextId) -> Result<ContextTls> {
        let mut tls = ContextTls::new();
        for (endpoint, files) in self.list_files(id)? {
            for file in files {
                let data = self.read(id, &endpoint, &file)?;
                tls.insert(&endpoint, &file, data);
            }
        }
        Ok(tls)
    }

    /// Make the endpoint's file set exactly `files`: stale files are removed,
    /// new ones written atomically one by one.
    pub fn reset_endpoint(&self, id: &ContextId, endpoint: &str, files: &EndpointFiles) -> Result<()> {
        check_path_component("endpoint", endpoint)?;
        for file in files.keys() {
            check_path_component("TLS file", file)?;
        }

        let dir = self.layout.tls_endpoint_dir(id, endpoint);
        for existing in list_dir(&dir, false)? {
            if !files.contains_key(&existing) {
                let path = dir.join(&existing);
                debug!("Removing stale TLS file {}", path.display());
                fs::remove_file(&path).map_err(|e| {
                    CtxError::io(format!("Failed to remove {}", path.display()), e)
                })?;
            }
        }

        for (file, data) in files {
            self.save(id, endpoint, file, data)?;
        }
        if files.is_empty() {
            remove_dir_if_exists(&dir)?;
        }
        Ok(())
    }
}

/// Sorted names of the directories (`dirs == true`) or regular files in `dir`.
/// An absent directory yields an empty list. Leftover temp files from an
/// interrupted write start with `.tmp` and are skipped.
fn list_dir(dir: &std::path::Path, dirs: bool) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CtxError::io(
                format!("Failed to list {}", dir.display()),
                e,
            ))
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| CtxError::io(format!("Failed to list {}", dir.display()), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| CtxError::io(format!("Failed to stat {}", entry.path().display()), e))?;
        if file_type.is_dir() != dirs {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(TEMP_PREFIX) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

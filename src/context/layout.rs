//! On-disk layout of the context store
//!
//! ```text
//! <root>/meta/<context-id>/metadata.json
//! <root>/tls/<context-id>/<endpoint>/<file>
//! ```
//!
//! Everything here is pure path arithmetic; nothing touches the filesystem.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::store;
use crate::error::{CtxError, Result};

use super::atomic::TEMP_PREFIX;

/// Directory key derived from a context name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(String);

impl ContextId {
    /// Derive the id of a context name (hex SHA-256 of the name)
    pub fn from_name(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        ContextId(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path builder rooted at the context store directory
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_root(&self) -> PathBuf {
        self.root.join(store::META_DIR)
    }

    pub fn meta_dir(&self, id: &ContextId) -> PathBuf {
        self.meta_root().join(id.as_str())
    }

    pub fn meta_file(&self, id: &ContextId) -> PathBuf {
        self.meta_dir(id).join(store::META_FILE)
    }

    pub fn tls_root(&self) -> PathBuf {
        self.root.join(store::TLS_DIR)
    }

    pub fn tls_dir(&self, id: &ContextId) -> PathBuf {
        self.tls_root().join(id.as_str())
    }

    pub fn tls_endpoint_dir(&self, id: &ContextId, endpoint: &str) -> PathBuf {
        self.tls_dir(id).join(endpoint)
    }

    pub fn tls_file(&self, id: &ContextId, endpoint: &str, file: &str) -> PathBuf {
        self.tls_endpoint_dir(id, endpoint).join(file)
    }
}

/// Check that `value` can be used as a single path component.
///
/// Endpoint type names and TLS file names end up in paths, so separators,
/// `.`/`..`, empty strings and the temporary file prefix are rejected.
pub fn check_path_component(kind: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
        || value.starts_with(TEMP_PREFIX);
    if invalid {
        return Err(CtxError::Validation(format!(
            "invalid {} name {:?}: must be a single path component",
            kind, value
        )));
    }
    Ok(())
}

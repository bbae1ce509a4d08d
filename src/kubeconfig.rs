//! Kubeconfig files
//!
//! Only the subset needed to describe one cluster connection is modelled:
//! clusters (server, CA), users (client certificate and key) and contexts
//! (cluster, user, namespace). Unknown fields are ignored on read.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::endpoint::{KubernetesEndpoint, TlsData};
use crate::error::{CtxError, Result};

/// Kubeconfig document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context", default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            clusters: Vec::new(),
            users: Vec::new(),
            contexts: Vec::new(),
            current_context: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub server: String,
    #[serde(rename = "certificate-authority", default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    #[serde(
        rename = "certificate-authority-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority_data: Option<String>,
    #[serde(rename = "insecure-skip-tls-verify", default, skip_serializing_if = "is_false")]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: AuthInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(rename = "client-certificate", default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(
        rename = "client-certificate-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key", default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(rename = "client-key-data", default, skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: KubeContext,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeContext {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl KubeConfig {
    /// Parse a kubeconfig document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content)
            .map_err(|e| CtxError::Decode(format!("invalid kubeconfig: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self)
            .map_err(|e| CtxError::Decode(format!("failed to serialize kubeconfig: {}", e)))
    }

    /// Single-context kubeconfig describing `endpoint`, with all TLS material
    /// inlined. Cluster, user and context entries are named after `name`.
    pub fn for_endpoint(name: &str, endpoint: &KubernetesEndpoint) -> Self {
        let tls = endpoint.tls.clone().unwrap_or_default();
        let namespace = Some(endpoint.meta.default_namespace.clone()).filter(|ns| !ns.is_empty());

        KubeConfig {
            clusters: vec![NamedCluster {
                name: name.to_string(),
                cluster: Cluster {
                    server: endpoint.meta.host.clone(),
                    certificate_authority: None,
                    certificate_authority_data: tls.ca.as_ref().map(|ca| BASE64.encode(ca)),
                    insecure_skip_tls_verify: endpoint.meta.skip_tls_verify,
                },
            }],
            users: vec![NamedUser {
                name: name.to_string(),
                user: AuthInfo {
                    client_certificate: None,
                    client_certificate_data: tls.cert.as_ref().map(|c| BASE64.encode(c)),
                    client_key: None,
                    client_key_data: tls.key.as_ref().map(|k| BASE64.encode(k)),
                },
            }],
            contexts: vec![NamedContext {
                name: name.to_string(),
                context: KubeContext {
                    cluster: name.to_string(),
                    user: name.to_string(),
                    namespace,
                },
            }],
            current_context: name.to_string(),
            ..Default::default()
        }
    }
}

/// Connection parameters resolved from a kubeconfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub insecure: bool,
    pub tls: TlsData,
}

/// What the store needs from a kubeconfig source
pub trait KubeConfigReader {
    /// Server address and TLS material of the selected context
    fn client_config(&self) -> Result<ClientConfig>;

    /// Namespace of the selected context and whether it was explicitly overridden
    fn namespace(&self) -> Result<(String, bool)>;
}

/// Kubeconfig loaded from a file or stream, with optional overrides
#[derive(Debug, Clone)]
pub struct KubeConfigLoader {
    config: KubeConfig,
    base_dir: Option<PathBuf>,
    context_override: Option<String>,
    namespace_override: Option<String>,
}

impl KubeConfigLoader {
    pub fn new(config: KubeConfig) -> Self {
        Self {
            config,
            base_dir: None,
            context_override: None,
            namespace_override: None,
        }
    }

    /// Load a kubeconfig file; relative file references resolve against its directory
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading kubeconfig from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CtxError::NotFound(format!("kubeconfig {} not found", path.display()))
            } else {
                CtxError::io(format!("Failed to read kubeconfig {}", path.display()), e)
            }
        })?;
        let mut loader = Self::new(KubeConfig::from_yaml(&content)?);
        loader.base_dir = path.parent().map(Path::to_path_buf);
        Ok(loader)
    }

    /// Load a kubeconfig from a stream (e.g. stdin)
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| CtxError::io("Failed to read kubeconfig stream", e))?;
        Ok(Self::new(KubeConfig::from_yaml(&content)?))
    }

    pub fn with_context_override(mut self, context: Option<String>) -> Self {
        self.context_override = context.filter(|c| !c.is_empty());
        self
    }

    pub fn with_namespace_override(mut self, namespace: Option<String>) -> Self {
        self.namespace_override = namespace.filter(|n| !n.is_empty());
        self
    }

    pub fn config(&self) -> &KubeConfig {
        &self.config
    }

    fn selected_context(&self) -> Result<&KubeContext> {
        let name = self
            .context_override
            .as_deref()
            .unwrap_or(self.config.current_context.as_str());
        if name.is_empty() {
            return Err(CtxError::Validation(
                "kubeconfig has no current context and no context was specified".to_string(),
            ));
        }
        self.config
            .contexts
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.context)
            .ok_or_else(|| CtxError::NotFound(format!("context {:?} not found in kubeconfig", name)))
    }

    /// Inline base64 data wins over a file reference
    fn material(&self, data: Option<&str>, file: Option<&str>, what: &str) -> Result<Option<Vec<u8>>> {
        if let Some(data) = data.filter(|d| !d.is_empty()) {
            let bytes = BASE64
                .decode(data.trim())
                .map_err(|e| CtxError::Decode(format!("invalid base64 in kubeconfig {}: {}", what, e)))?;
            return Ok(Some(bytes));
        }
        if let Some(file) = file.filter(|f| !f.is_empty()) {
            let path = match &self.base_dir {
                Some(base) if Path::new(file).is_relative() => base.join(file),
                _ => PathBuf::from(file),
            };
            let bytes = fs::read(&path).map_err(|e| {
                CtxError::io(format!("Failed to read kubeconfig {} {}", what, path.display()), e)
            })?;
            return Ok(Some(bytes));
        }
        Ok(None)
    }
}

impl KubeConfigReader for KubeConfigLoader {
    fn client_config(&self) -> Result<ClientConfig> {
        let context = self.selected_context()?;
        let cluster = self
            .config
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| {
                CtxError::NotFound(format!("cluster {:?} not found in kubeconfig", context.cluster))
            })?;
        if cluster.server.is_empty() {
            return Err(CtxError::Validation(format!(
                "cluster {:?} has no server address",
                context.cluster
            )));
        }

        let user = self
            .config
            .users
            .iter()
            .find(|u| u.name == context.user)
            .map(|u| u.user.clone())
            .unwrap_or_default();

        let tls = TlsData {
            ca: self.material(
                cluster.certificate_authority_data.as_deref(),
                cluster.certificate_authority.as_deref(),
                "certificate authority",
            )?,
            cert: self.material(
                user.client_certificate_data.as_deref(),
                user.client_certificate.as_deref(),
                "client certificate",
            )?,
            key: self.material(
                user.client_key_data.as_deref(),
                user.client_key.as_deref(),
                "client key",
            )?,
        };

        debug!("Resolved kubeconfig cluster {:?} at {}", context.cluster, cluster.server);
        Ok(ClientConfig {
            host: cluster.server.clone(),
            insecure: cluster.insecure_skip_tls_verify,
            tls,
        })
    }

    fn namespace(&self) -> Result<(String, bool)> {
        if let Some(ns) = &self.namespace_override {
            return Ok((ns.clone(), true));
        }
        let context = self.selected_context()?;
        match context.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => Ok((ns.to_string(), false)),
            _ => Ok((defaults::NAMESPACE.to_string(), false)),
        }
    }
}

/// Kubeconfig path from a `KUBECONFIG`-style value (first non-empty entry),
/// else `~/.kube/config`
pub fn default_kubeconfig_path(kubeconfig_env: Option<&str>) -> Option<PathBuf> {
    if let Some(value) = kubeconfig_env {
        if let Some(first) = std::env::split_paths(value).find(|p| !p.as_os_str().is_empty()) {
            return Some(first);
        }
    }
    dirs::home_dir().map(|home| home.join(defaults::KUBECONFIG_PATH))
}

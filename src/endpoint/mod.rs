//! Typed endpoint metadata
//!
//! A context holds at most one endpoint per endpoint type. The set of types
//! is a closed enum; decoding from disk goes through
//! [`EndpointRegistry`](crate::context::EndpointRegistry), which selects the
//! variant from the type name before the payload is parsed.

mod docker;
mod kubernetes;

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::tls as tls_files;
use crate::context::EndpointFiles;
use crate::error::Result;

pub use docker::{
    validate_docker_host, DockerEndpoint, DockerEndpointMeta, EngineHttpClient, DOCKER_ENDPOINT,
};
pub use kubernetes::{KubernetesEndpoint, KubernetesEndpointMeta, KUBERNETES_ENDPOINT};

/// Endpoint metadata of any registered kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointMeta {
    Docker(DockerEndpointMeta),
    Kubernetes(KubernetesEndpointMeta),
}

impl EndpointMeta {
    /// Type name under which this endpoint is stored
    pub fn type_name(&self) -> &'static str {
        match self {
            EndpointMeta::Docker(_) => DOCKER_ENDPOINT,
            EndpointMeta::Kubernetes(_) => KUBERNETES_ENDPOINT,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            EndpointMeta::Docker(meta) => &meta.host,
            EndpointMeta::Kubernetes(meta) => &meta.host,
        }
    }
}

impl Serialize for EndpointMeta {
    // The type name lives in the enclosing map key, so only the payload is written
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            EndpointMeta::Docker(meta) => meta.serialize(serializer),
            EndpointMeta::Kubernetes(meta) => meta.serialize(serializer),
        }
    }
}

impl From<DockerEndpointMeta> for EndpointMeta {
    fn from(meta: DockerEndpointMeta) -> Self {
        EndpointMeta::Docker(meta)
    }
}

impl From<KubernetesEndpointMeta> for EndpointMeta {
    fn from(meta: KubernetesEndpointMeta) -> Self {
        EndpointMeta::Kubernetes(meta)
    }
}

/// Read access to stored TLS material, scoped by context name
pub trait TlsSource {
    /// Stored files as endpoint type -> file names
    fn list_tls_files(&self, context: &str) -> Result<BTreeMap<String, BTreeSet<String>>>;

    /// Content of one stored file
    fn tls_data(&self, context: &str, endpoint: &str, file: &str) -> Result<Vec<u8>>;
}

/// CA, client certificate and key of one endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsData {
    pub ca: Option<Vec<u8>>,
    pub cert: Option<Vec<u8>>,
    pub key: Option<Vec<u8>>,
}

impl TlsData {
    /// Load the well-known TLS files of an endpoint.
    ///
    /// Returns `None` when the endpoint has no TLS material at all.
    pub fn load<S: TlsSource + ?Sized>(
        source: &S,
        context: &str,
        endpoint: &str,
    ) -> Result<Option<TlsData>> {
        let listed = source.list_tls_files(context)?;
        let files = match listed.get(endpoint) {
            Some(files) if !files.is_empty() => files,
            _ => return Ok(None),
        };

        let read = |name: &str| -> Result<Option<Vec<u8>>> {
            if files.contains(name) {
                source.tls_data(context, endpoint, name).map(Some)
            } else {
                Ok(None)
            }
        };

        Ok(Some(TlsData {
            ca: read(tls_files::CA_FILE)?,
            cert: read(tls_files::CERT_FILE)?,
            key: read(tls_files::KEY_FILE)?,
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.ca.is_none() && self.cert.is_none() && self.key.is_none()
    }

    /// File set as stored by the TLS manager
    pub fn to_files(&self) -> EndpointFiles {
        let mut files = EndpointFiles::new();
        if let Some(ca) = &self.ca {
            files.insert(tls_files::CA_FILE.to_string(), ca.clone());
        }
        if let Some(cert) = &self.cert {
            files.insert(tls_files::CERT_FILE.to_string(), cert.clone());
        }
        if let Some(key) = &self.key {
            files.insert(tls_files::KEY_FILE.to_string(), key.clone());
        }
        files
    }
}

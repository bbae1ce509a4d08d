//! Kubernetes orchestrator endpoint

use log::debug;
use serde::{Deserialize, Serialize};

use crate::kubeconfig::{KubeConfig, KubeConfigReader};
use crate::error::Result;

use super::{TlsData, TlsSource};

/// Endpoint type name of the Kubernetes endpoint
pub const KUBERNETES_ENDPOINT: &str = "kubernetes";

/// Stored Kubernetes endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesEndpointMeta {
    #[serde(rename = "Host", default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(rename = "SkipTLSVerify", default)]
    pub skip_tls_verify: bool,
    #[serde(rename = "DefaultNamespace", default, skip_serializing_if = "String::is_empty")]
    pub default_namespace: String,
}

/// Kubernetes endpoint resolved together with its TLS material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubernetesEndpoint {
    pub meta: KubernetesEndpointMeta,
    pub tls: Option<TlsData>,
}

impl KubernetesEndpointMeta {
    pub fn new(host: impl Into<String>, default_namespace: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            skip_tls_verify: false,
            default_namespace: default_namespace.into(),
        }
    }

    /// Attach the TLS material stored for this endpoint in `context`
    pub fn with_tls_data<S: TlsSource + ?Sized>(
        &self,
        source: &S,
        context: &str,
    ) -> Result<KubernetesEndpoint> {
        let tls = TlsData::load(source, context, KUBERNETES_ENDPOINT)?;
        Ok(KubernetesEndpoint {
            meta: self.clone(),
            tls,
        })
    }

    /// Convert the selected context of a kubeconfig into endpoint metadata
    /// plus the TLS material it references
    pub fn from_kubeconfig<R: KubeConfigReader + ?Sized>(
        reader: &R,
    ) -> Result<(KubernetesEndpointMeta, Option<TlsData>)> {
        let client = reader.client_config()?;
        let (namespace, _) = reader.namespace()?;
        debug!(
            "Kubernetes endpoint from kubeconfig: host={} namespace={}",
            client.host, namespace
        );

        let meta = KubernetesEndpointMeta {
            host: client.host,
            skip_tls_verify: client.insecure,
            default_namespace: namespace,
        };
        let tls = Some(client.tls).filter(|tls| !tls.is_empty());
        Ok((meta, tls))
    }
}

impl KubernetesEndpoint {
    /// Kubeconfig projection of this endpoint (lossy: engine endpoint and
    /// context metadata are not represented)
    pub fn kubeconfig(&self, context_name: &str) -> KubeConfig {
        KubeConfig::for_endpoint(context_name, self)
    }
}

//! Container engine endpoint

use log::debug;
use reqwest::{Certificate, Client, Identity};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{CtxError, Result};

use super::{TlsData, TlsSource};

/// Endpoint type name of the container engine endpoint
pub const DOCKER_ENDPOINT: &str = "docker";

const SUPPORTED_SCHEMES: &[&str] = &["tcp", "unix", "npipe", "ssh", "fd", "http", "https"];

/// Stored container engine endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerEndpointMeta {
    #[serde(rename = "Host", default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(rename = "SkipTLSVerify", default)]
    pub skip_tls_verify: bool,
}

/// Engine endpoint resolved together with its TLS material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerEndpoint {
    pub meta: DockerEndpointMeta,
    pub tls: Option<TlsData>,
}

impl DockerEndpointMeta {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            skip_tls_verify: false,
        }
    }

    /// Attach the TLS material stored for this endpoint in `context`
    pub fn with_tls_data<S: TlsSource + ?Sized>(
        &self,
        source: &S,
        context: &str,
    ) -> Result<DockerEndpoint> {
        let tls = TlsData::load(source, context, DOCKER_ENDPOINT)?;
        Ok(DockerEndpoint {
            meta: self.clone(),
            tls,
        })
    }
}

/// Check that `host` is a usable engine address and return it unchanged
pub fn validate_docker_host(host: &str) -> Result<String> {
    let url = Url::parse(host)
        .map_err(|e| CtxError::Validation(format!("unable to parse docker host `{}`: {}", host, e)))?;
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(CtxError::Validation(format!(
            "unable to parse docker host `{}`: unsupported scheme {:?}",
            host,
            url.scheme()
        )));
    }
    Ok(host.to_string())
}

impl DockerEndpoint {
    /// Build an HTTP client that trusts the endpoint CA and presents its
    /// client certificate
    pub fn http_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30));

        if let Some(tls) = &self.tls {
            if let Some(ca) = &tls.ca {
                let cert = Certificate::from_pem(ca).map_err(|e| {
                    CtxError::Validation(format!("invalid CA certificate: {}", e))
                })?;
                builder = builder.add_root_certificate(cert);
            }
            if let (Some(cert), Some(key)) = (&tls.cert, &tls.key) {
                let mut pem = cert.clone();
                pem.push(b'\n');
                pem.extend_from_slice(key);
                let identity = Identity::from_pem(&pem).map_err(|e| {
                    CtxError::Validation(format!("invalid client certificate or key: {}", e))
                })?;
                builder = builder.identity(identity);
            }
        }

        if self.meta.skip_tls_verify {
            debug!("TLS verification disabled for {}", self.meta.host);
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }

    /// Engine client capability used by the namespace lister
    pub fn client(&self) -> Result<EngineHttpClient> {
        Ok(EngineHttpClient::new(self.meta.host.clone(), self.http_client()?))
    }
}

/// Daemon address paired with an HTTP transport configured for it
#[derive(Debug, Clone)]
pub struct EngineHttpClient {
    daemon_host: String,
    http: Client,
}

impl EngineHttpClient {
    pub fn new(daemon_host: impl Into<String>, http: Client) -> Self {
        Self {
            daemon_host: daemon_host.into(),
            http,
        }
    }

    pub fn daemon_host(&self) -> &str {
        &self.daemon_host
    }

    pub fn http(&self) -> &Client {
        &self.http
    }
}

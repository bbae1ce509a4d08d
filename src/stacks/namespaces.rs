//! User-visible namespace listing through the engine endpoint

use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::namespaces as ns_config;
use crate::endpoint::EngineHttpClient;
use crate::error::{CtxError, Result};

use super::NamespaceLister;

/// What the namespace lister needs from an engine client
pub trait EngineClient {
    /// Address of the engine daemon
    fn daemon_host(&self) -> &str;

    /// HTTP transport configured for the daemon (TLS material, timeouts)
    fn http_client(&self) -> &Client;
}

impl EngineClient for EngineHttpClient {
    fn daemon_host(&self) -> &str {
        EngineHttpClient::daemon_host(self)
    }

    fn http_client(&self) -> &Client {
        self.http()
    }
}

#[derive(Deserialize)]
struct NamespaceList {
    #[serde(default)]
    items: Vec<NamespaceItem>,
}

#[derive(Deserialize)]
struct NamespaceItem {
    metadata: NamespaceMetadata,
}

#[derive(Deserialize)]
struct NamespaceMetadata {
    name: String,
}

/// Asks the engine's management API which namespaces the user may see
#[derive(Debug, Clone)]
pub struct UserVisibleNamespaceLister<C> {
    client: C,
    /// Custom base URL override (for testing with mock servers)
    base_url_override: Option<String>,
}

impl<C: EngineClient> UserVisibleNamespaceLister<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            base_url_override: None,
        }
    }

    /// Lister talking to `base_url` instead of the daemon host
    #[cfg(test)]
    pub fn with_base_url(client: C, base_url: String) -> Self {
        Self {
            client,
            base_url_override: Some(base_url),
        }
    }

    fn namespaces_url(&self) -> Result<String> {
        if let Some(base) = &self.base_url_override {
            return Ok(format!("{}{}", base.trim_end_matches('/'), ns_config::API_PATH));
        }
        namespaces_url(self.client.daemon_host())
    }
}

/// HTTPS URL of the namespace API on the daemon's host and port
fn namespaces_url(daemon_host: &str) -> Result<String> {
    let parsed = Url::parse(daemon_host).map_err(|e| {
        CtxError::Validation(format!("unable to parse docker host `{}`: {}", daemon_host, e))
    })?;
    let host = parsed.host_str().ok_or_else(|| {
        CtxError::Validation(format!(
            "docker host `{}` has no network address",
            daemon_host
        ))
    })?;

    let mut url = Url::parse(&format!("https://{}", host)).map_err(|e| {
        CtxError::Validation(format!("unable to parse docker host `{}`: {}", daemon_host, e))
    })?;
    url.set_port(parsed.port()).map_err(|_| {
        CtxError::Validation(format!("invalid port in docker host `{}`", daemon_host))
    })?;
    url.set_path(ns_config::API_PATH);
    Ok(url.to_string())
}

impl<C: EngineClient> NamespaceLister for UserVisibleNamespaceLister<C> {
    async fn list(&self) -> Result<Option<Vec<String>>> {
        let url = self.namespaces_url()?;
        debug!("Querying user visible namespaces at {}", url);

        let response = self.client.http_client().get(&url).send().await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| CtxError::Api {
            status: status.as_u16(),
            message: format!("received {} status and unable to read response: {}", status.as_u16(), e),
        })?;

        match status {
            StatusCode::OK => {
                let list: NamespaceList = serde_json::from_str(&body).map_err(|e| {
                    CtxError::Decode(format!("unmarshal failed: {}: {}", e, body))
                })?;
                let namespaces: Vec<String> =
                    list.items.into_iter().map(|item| item.metadata.name).collect();
                debug!("Found {} user visible namespaces", namespaces.len());
                Ok(Some(namespaces))
            }
            StatusCode::NOT_FOUND => {
                debug!("Namespace API not present on {}", self.client.daemon_host());
                Ok(None)
            }
            _ => Err(CtxError::Api {
                status: status.as_u16(),
                message: format!(
                    "received {} status while retrieving namespaces: {}",
                    status.as_u16(),
                    body
                ),
            }),
        }
    }
}

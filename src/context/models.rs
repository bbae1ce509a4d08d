//! Context data models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::endpoint::{
    DockerEndpointMeta, EndpointMeta, KubernetesEndpointMeta, DOCKER_ENDPOINT, KUBERNETES_ENDPOINT,
};
use crate::error::{CtxError, Result};

use super::orchestrator::Orchestrator;
use super::registry::EndpointRegistry;

/// A named set of endpoints plus free-form metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Context {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Metadata")]
    pub metadata: ContextInfo,
    /// Endpoint type name -> endpoint
    #[serde(rename = "Endpoints")]
    pub endpoints: BTreeMap<String, EndpointMeta>,
}

/// Context-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    #[serde(rename = "Description", default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(
        rename = "StackOrchestrator",
        default,
        skip_serializing_if = "Orchestrator::is_unset"
    )]
    pub stack_orchestrator: Orchestrator,
    /// Fields written by other tools, kept verbatim
    #[serde(flatten)]
    pub additional_fields: BTreeMap<String, serde_json::Value>,
}

/// On-disk shape before endpoint payloads are decoded
#[derive(Deserialize)]
struct RawContext {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Metadata", default)]
    metadata: ContextInfo,
    #[serde(rename = "Endpoints", default)]
    endpoints: BTreeMap<String, serde_json::Value>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: ContextInfo::default(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.metadata.stack_orchestrator = orchestrator;
        self
    }

    /// Add or replace the endpoint of the same type
    pub fn with_endpoint(mut self, endpoint: impl Into<EndpointMeta>) -> Self {
        self.set_endpoint(endpoint);
        self
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<EndpointMeta>) {
        let endpoint = endpoint.into();
        self.endpoints
            .insert(endpoint.type_name().to_string(), endpoint);
    }

    pub fn docker_endpoint(&self) -> Option<&DockerEndpointMeta> {
        match self.endpoints.get(DOCKER_ENDPOINT) {
            Some(EndpointMeta::Docker(meta)) => Some(meta),
            _ => None,
        }
    }

    pub fn kubernetes_endpoint(&self) -> Option<&KubernetesEndpointMeta> {
        match self.endpoints.get(KUBERNETES_ENDPOINT) {
            Some(EndpointMeta::Kubernetes(meta)) => Some(meta),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| CtxError::Decode(format!("failed to serialize context {:?}: {}", self.name, e)))
    }

    /// Decode stored metadata, resolving each endpoint through `registry`
    pub fn from_json(bytes: &[u8], registry: &EndpointRegistry) -> Result<Self> {
        let raw: RawContext = serde_json::from_slice(bytes)
            .map_err(|e| CtxError::Decode(format!("invalid context metadata: {}", e)))?;

        let mut endpoints = BTreeMap::new();
        for (type_name, value) in raw.endpoints {
            let meta = registry.decode(&type_name, value)?;
            endpoints.insert(type_name, meta);
        }

        Ok(Self {
            name: raw.name,
            metadata: raw.metadata,
            endpoints,
        })
    }
}

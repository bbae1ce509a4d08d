//! Endpoint type registry
//!
//! Maps an endpoint type name to the function decoding its stored payload.
//! The store looks the decoder up by the map key of each endpoint, so an
//! unknown key is reported instead of being dropped.

use std::collections::BTreeMap;

use crate::endpoint::{
    DockerEndpointMeta, EndpointMeta, KubernetesEndpointMeta, DOCKER_ENDPOINT, KUBERNETES_ENDPOINT,
};
use crate::error::{CtxError, Result};

/// Decoder turning a stored JSON payload into typed endpoint metadata
pub type DecodeFn = fn(serde_json::Value) -> serde_json::Result<EndpointMeta>;

#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    decoders: BTreeMap<String, DecodeFn>,
}

impl Default for EndpointRegistry {
    /// Registry with the built-in docker and kubernetes endpoint types
    fn default() -> Self {
        let mut decoders: BTreeMap<String, DecodeFn> = BTreeMap::new();
        decoders.insert(DOCKER_ENDPOINT.to_string(), |value| {
            serde_json::from_value::<DockerEndpointMeta>(value).map(EndpointMeta::Docker)
        });
        decoders.insert(KUBERNETES_ENDPOINT.to_string(), |value| {
            serde_json::from_value::<KubernetesEndpointMeta>(value).map(EndpointMeta::Kubernetes)
        });
        Self { decoders }
    }
}

impl EndpointRegistry {
    /// Registry without any endpoint type
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Register a decoder; registering a type name twice is a configuration error
    pub fn register(&mut self, type_name: &str, decode: DecodeFn) -> Result<()> {
        if self.decoders.contains_key(type_name) {
            return Err(CtxError::Config(format!(
                "endpoint type {:?} is already registered",
                type_name
            )));
        }
        self.decoders.insert(type_name.to_string(), decode);
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    /// Decode a stored payload tagged with `type_name`
    pub fn decode(&self, type_name: &str, value: serde_json::Value) -> Result<EndpointMeta> {
        let decode = self.decoders.get(type_name).ok_or_else(|| {
            CtxError::Decode(format!("unknown endpoint type {:?}", type_name))
        })?;
        let meta = decode(value).map_err(|e| {
            CtxError::Decode(format!("invalid {} endpoint metadata: {}", type_name, e))
        })?;
        if meta.type_name() != type_name {
            return Err(CtxError::Decode(format!(
                "endpoint type {:?} decoded as {:?}",
                type_name,
                meta.type_name()
            )));
        }
        Ok(meta)
    }
}

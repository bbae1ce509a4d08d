//! Default stack orchestrator setting and its validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CtxError, Result};

/// Workload backend selected by default for stack commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orchestrator {
    #[default]
    #[serde(alias = "")]
    Unset,
    Swarm,
    Kubernetes,
    All,
}

impl Orchestrator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orchestrator::Unset => "unset",
            Orchestrator::Swarm => "swarm",
            Orchestrator::Kubernetes => "kubernetes",
            Orchestrator::All => "all",
        }
    }

    pub fn is_unset(&self) -> bool {
        *self == Orchestrator::Unset
    }

    pub fn has_kubernetes(&self) -> bool {
        matches!(self, Orchestrator::Kubernetes | Orchestrator::All)
    }

    pub fn has_swarm(&self) -> bool {
        matches!(self, Orchestrator::Swarm | Orchestrator::All)
    }

    /// Display form used in listings: unset shows as empty
    pub fn display_value(&self) -> &'static str {
        if self.is_unset() {
            ""
        } else {
            self.as_str()
        }
    }
}

impl fmt::Display for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orchestrator {
    type Err = CtxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "unset" => Ok(Orchestrator::Unset),
            "swarm" => Ok(Orchestrator::Swarm),
            "kubernetes" => Ok(Orchestrator::Kubernetes),
            "all" => Ok(Orchestrator::All),
            _ => Err(CtxError::Validation(format!(
                "specified orchestrator {:?} is invalid, please use either kubernetes, swarm or all",
                s
            ))),
        }
    }
}

/// Validate a requested default orchestrator against the endpoints a
/// context will have. Pure; call it before mutating the store.
pub fn validate_orchestrator(requested: &str, has_kubernetes_endpoint: bool) -> Result<Orchestrator> {
    let orchestrator: Orchestrator = requested.parse()?;
    check_kubernetes_endpoint(orchestrator, has_kubernetes_endpoint)?;
    Ok(orchestrator)
}

/// A Kubernetes-capable orchestrator needs a Kubernetes endpoint
pub(crate) fn check_kubernetes_endpoint(
    orchestrator: Orchestrator,
    has_kubernetes_endpoint: bool,
) -> Result<()> {
    if orchestrator.has_kubernetes() && !has_kubernetes_endpoint {
        return Err(CtxError::Validation(format!(
            "cannot specify orchestrator {:?} without configuring a Kubernetes endpoint",
            orchestrator.as_str()
        )));
    }
    Ok(())
}

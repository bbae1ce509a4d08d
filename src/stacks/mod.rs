//! Stack listing across Kubernetes namespaces
//!
//! Listing merges results from several sources. A failing source does not
//! hide the others: its error is collected next to the stacks that could be
//! listed ([`PartialResult`]).

mod commands;
mod kubernetes;
mod namespaces;

pub use commands::run_namespaces_command;
pub use kubernetes::{
    get_stacks, is_all_namespaces_enabled, remove_duplicates, sort_stacks, CompositeStackLister,
};
pub use namespaces::{EngineClient, UserVisibleNamespaceLister};

use crate::error::{CtxError, Result};

/// One deployed stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub name: String,
    /// Number of services in the stack
    pub services: usize,
    pub orchestrator: String,
    pub namespace: String,
}

impl Stack {
    pub fn kubernetes(name: impl Into<String>, namespace: impl Into<String>, services: usize) -> Self {
        Self {
            name: name.into(),
            services,
            orchestrator: "Kubernetes".to_string(),
            namespace: namespace.into(),
        }
    }
}

/// Items that could be listed plus the non-fatal per-source errors
#[derive(Debug)]
pub struct PartialResult<T> {
    pub items: Vec<T>,
    pub errors: Vec<CtxError>,
}

impl<T> Default for PartialResult<T> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl<T> PartialResult<T> {
    pub fn new(items: Vec<T>, errors: Vec<CtxError>) -> Self {
        Self { items, errors }
    }

    /// Append another source's items and errors
    pub fn merge(&mut self, other: PartialResult<T>) {
        self.items.extend(other.items);
        self.errors.extend(other.errors);
    }
}

/// Stack listing options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Namespaces to list; empty means the cluster default
    pub namespaces: Vec<String>,
    pub all_namespaces: bool,
}

/// Lists the stacks visible to one client
#[allow(async_fn_in_trait)]
pub trait StackLister {
    async fn list(&self) -> Result<PartialResult<Stack>>;
}

/// Lists the namespaces the current user may see.
///
/// `Ok(None)` means the namespace API is not available on the server.
#[allow(async_fn_in_trait)]
pub trait NamespaceLister {
    async fn list(&self) -> Result<Option<Vec<String>>>;
}

/// Creates stack listers scoped to a namespace (or to all namespaces)
pub trait StackClientFactory {
    type Lister: StackLister;

    fn stacks(&self, namespace: &str, all_namespaces: bool) -> Result<Self::Lister>;
}

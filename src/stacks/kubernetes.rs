//! Kubernetes stack aggregation

use futures::future::join_all;
use log::debug;
use std::collections::HashSet;

use crate::context::KubernetesConfig;
use crate::config::namespaces as ns_config;
use crate::error::{CtxError, Result};

use super::{ListOptions, NamespaceLister, PartialResult, Stack, StackClientFactory, StackLister};

/// Lister merging the results of several listers.
///
/// A lister that fails outright contributes its error instead of stacks.
#[derive(Debug, Clone)]
pub struct CompositeStackLister<L> {
    listers: Vec<L>,
}

impl<L: StackLister> CompositeStackLister<L> {
    pub fn new(listers: Vec<L>) -> Self {
        Self { listers }
    }
}

impl<L: StackLister> StackLister for CompositeStackLister<L> {
    async fn list(&self) -> Result<PartialResult<Stack>> {
        let results = join_all(self.listers.iter().map(|lister| lister.list())).await;

        let mut merged = PartialResult::default();
        for result in results {
            match result {
                Ok(partial) => merged.merge(partial),
                Err(e) => merged.errors.push(e),
            }
        }
        Ok(merged)
    }
}

/// Cluster-wide listing is allowed unless the CLI config sets
/// `kubernetes.allNamespaces` to `"disabled"`
pub fn is_all_namespaces_enabled(config: Option<&KubernetesConfig>) -> bool {
    config.and_then(|c| c.all_namespaces.as_deref()) != Some(ns_config::ALL_NAMESPACES_DISABLED)
}

/// List Kubernetes stacks.
///
/// Without explicit namespaces, stacks of all namespaces are listed (unless
/// disabled in the CLI config). When the server forbids a cluster-wide
/// listing, the user-visible namespaces are listed one by one instead.
pub async fn get_stacks<F, N>(
    factory: &F,
    namespace_lister: &N,
    opts: &ListOptions,
    config: Option<&KubernetesConfig>,
) -> Result<PartialResult<Stack>>
where
    F: StackClientFactory,
    N: NamespaceLister,
{
    if opts.all_namespaces || opts.namespaces.is_empty() {
        let all_namespaces = opts.all_namespaces || is_all_namespaces_enabled(config);
        return get_stacks_with_all_namespaces(factory, namespace_lister, all_namespaces).await;
    }
    get_stacks_with_namespaces(factory, &remove_duplicates(&opts.namespaces)).await
}

async fn get_stacks_with_all_namespaces<F, N>(
    factory: &F,
    namespace_lister: &N,
    all_namespaces: bool,
) -> Result<PartialResult<Stack>>
where
    F: StackClientFactory,
    N: NamespaceLister,
{
    let lister = factory.stacks("", all_namespaces)?;
    let err = match lister.list().await {
        Err(e) if e.is_forbidden() => e,
        other => return other,
    };

    debug!("Cluster-wide stack listing forbidden, trying user visible namespaces");
    let namespaces = namespace_lister.list().await.map_err(|e| match e {
        CtxError::Api { status, message } => CtxError::Api {
            status,
            message: format!("failed to query user visible namespaces: {}", message),
        },
        other => other,
    })?;

    match namespaces {
        Some(namespaces) => get_stacks_with_namespaces(factory, &namespaces).await,
        // No namespace API on the server: the original answer stands
        None => Err(err),
    }
}

async fn get_stacks_with_namespaces<F>(factory: &F, namespaces: &[String]) -> Result<PartialResult<Stack>>
where
    F: StackClientFactory,
{
    let listers = namespaces
        .iter()
        .map(|namespace| factory.stacks(namespace, false))
        .collect::<Result<Vec<_>>>()?;
    CompositeStackLister::new(listers).list().await
}

/// Drop repeated namespaces, keeping the first occurrence
pub fn remove_duplicates(namespaces: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    namespaces
        .iter()
        .filter(|ns| seen.insert(ns.as_str()))
        .cloned()
        .collect()
}

/// Sort by name, then namespace
pub fn sort_stacks(stacks: &mut [Stack]) {
    stacks.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.namespace.cmp(&b.namespace)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Clone, Default)]
    struct FakeStackLister {
        stacks: Vec<Stack>,
        errs: Vec<String>,
        err: Option<u16>,
    }

    impl StackLister for FakeStackLister {
        async fn list(&self) -> Result<PartialResult<Stack>> {
            if let Some(status) = self.err {
                return Err(CtxError::Api {
                    status,
                    message: "stack lister failed".to_string(),
                });
            }
            Ok(PartialResult::new(
                self.stacks.clone(),
                self.errs
                    .iter()
                    .map(|e| CtxError::Validation(e.clone()))
                    .collect(),
            ))
        }
    }

    struct FakeNamespaceLister {
        result: std::result::Result<Option<Vec<String>>, u16>,
    }

    impl NamespaceLister for FakeNamespaceLister {
        async fn list(&self) -> Result<Option<Vec<String>>> {
            match &self.result {
                Ok(namespaces) => Ok(namespaces.clone()),
                Err(status) => Err(CtxError::Api {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct FakeStackClientFactory {
        clients: HashMap<String, FakeStackLister>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeStackClientFactory {
        fn with(mut self, key: &str, lister: FakeStackLister) -> Self {
            self.clients.insert(key.to_string(), lister);
            self
        }
    }

    impl StackClientFactory for FakeStackClientFactory {
        type Lister = FakeStackLister;

        fn stacks(&self, namespace: &str, all_namespaces: bool) -> Result<FakeStackLister> {
            let key = format!("{}-{}", namespace, all_namespaces);
            self.requested.borrow_mut().push(key.clone());
            self.clients.get(&key).cloned().ok_or_else(|| {
                CtxError::NotFound(format!(
                    "failed to find stack client factory for namespace '{}'",
                    namespace
                ))
            })
        }
    }

    fn no_namespaces() -> FakeNamespaceLister {
        FakeNamespaceLister { result: Ok(None) }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_stacks_returns_stacks_and_errors_with_all_namespaces() {
        let factory = FakeStackClientFactory::default().with(
            "-true",
            FakeStackLister {
                stacks: vec![Stack::kubernetes("foo", "space", 2), Stack::kubernetes("bar", "space", 1)],
                errs: strings(&["invalid stack bar", "could not parse stack baz"]),
                err: None,
            },
        );
        let opts = ListOptions {
            all_namespaces: true,
            ..Default::default()
        };

        let result = get_stacks(&factory, &no_namespaces(), &opts, None).await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_get_stacks_merges_stacks_and_errors_from_namespaces() {
        let factory = FakeStackClientFactory::default()
            .with(
                "valid-false",
                FakeStackLister {
                    stacks: vec![Stack::kubernetes("foo", "valid", 2), Stack::kubernetes("bar", "valid", 1)],
                    ..Default::default()
                },
            )
            .with(
                "witherrors-false",
                FakeStackLister {
                    stacks: vec![Stack::kubernetes("foo", "witherrors", 2)],
                    errs: strings(&["invalid stack bar", "could not parse stack baz"]),
                    err: None,
                },
            )
            .with(
                "invalid-false",
                FakeStackLister {
                    err: Some(500),
                    ..Default::default()
                },
            );
        let opts = ListOptions {
            namespaces: strings(&["valid", "witherrors", "invalid"]),
            all_namespaces: false,
        };

        let result = get_stacks(&factory, &no_namespaces(), &opts, None).await.unwrap();
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.errors.len(), 3);
    }

    #[tokio::test]
    async fn test_forbidden_falls_back_to_visible_namespaces() {
        let factory = FakeStackClientFactory::default()
            .with(
                "-true",
                FakeStackLister {
                    err: Some(403),
                    ..Default::default()
                },
            )
            .with(
                "a-false",
                FakeStackLister {
                    stacks: vec![Stack::kubernetes("one", "a", 1)],
                    ..Default::default()
                },
            )
            .with(
                "b-false",
                FakeStackLister {
                    stacks: vec![Stack::kubernetes("two", "b", 1)],
                    ..Default::default()
                },
            );
        let namespaces = FakeNamespaceLister {
            result: Ok(Some(strings(&["a", "b"]))),
        };

        let result = get_stacks(&factory, &namespaces, &ListOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(result.items.len(), 2);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_without_namespace_api_keeps_original_error() {
        let factory = FakeStackClientFactory::default().with(
            "-true",
            FakeStackLister {
                err: Some(403),
                ..Default::default()
            },
        );

        let err = get_stacks(&factory, &no_namespaces(), &ListOptions::default(), None)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn test_namespace_query_failure_is_reported() {
        let factory = FakeStackClientFactory::default().with(
            "-true",
            FakeStackLister {
                err: Some(403),
                ..Default::default()
            },
        );
        let namespaces = FakeNamespaceLister { result: Err(500) };

        let err = get_stacks(&factory, &namespaces, &ListOptions::default(), None)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to query user visible namespaces"));
    }

    #[tokio::test]
    async fn test_disabled_all_namespaces_uses_default_namespace() {
        let factory = FakeStackClientFactory::default().with(
            "-false",
            FakeStackLister {
                stacks: vec![Stack::kubernetes("foo", "default", 1)],
                ..Default::default()
            },
        );
        let config = KubernetesConfig {
            all_namespaces: Some("disabled".to_string()),
        };

        let result = get_stacks(&factory, &no_namespaces(), &ListOptions::default(), Some(&config))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(*factory.requested.borrow(), vec!["-false".to_string()]);
    }

    #[tokio::test]
    async fn test_explicit_flag_overrides_disabled_config() {
        let factory = FakeStackClientFactory::default().with("-true", FakeStackLister::default());
        let config = KubernetesConfig {
            all_namespaces: Some("disabled".to_string()),
        };
        let opts = ListOptions {
            all_namespaces: true,
            ..Default::default()
        };

        get_stacks(&factory, &no_namespaces(), &opts, Some(&config))
            .await
            .unwrap();
        assert_eq!(*factory.requested.borrow(), vec!["-true".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_namespaces_listed_once() {
        let factory = FakeStackClientFactory::default().with(
            "a-false",
            FakeStackLister {
                stacks: vec![Stack::kubernetes("one", "a", 1)],
                ..Default::default()
            },
        );
        let opts = ListOptions {
            namespaces: strings(&["a", "a"]),
            all_namespaces: false,
        };

        let result = get_stacks(&factory, &no_namespaces(), &opts, None).await.unwrap();
        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_namespace_client_is_fatal() {
        let factory = FakeStackClientFactory::default();
        let opts = ListOptions {
            namespaces: strings(&["nowhere"]),
            all_namespaces: false,
        };
        let err = get_stacks(&factory, &no_namespaces(), &opts, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_composite_lister_merges_partial_results() {
        let healthy = FakeStackLister {
            stacks: vec![Stack::kubernetes("web", "team-a", 2)],
            errs: strings(&["one stack unreadable"]),
            ..FakeStackLister::default()
        };
        let broken = FakeStackLister {
            err: Some(500),
            ..FakeStackLister::default()
        };
        let composite = CompositeStackLister::new(vec![healthy, broken]);

        let result = composite.list().await.unwrap();
        assert_eq!(result.items, vec![Stack::kubernetes("web", "team-a", 2)]);
        assert_eq!(result.errors.len(), 2);

        let empty = CompositeStackLister::<FakeStackLister>::new(Vec::new());
        let result = empty.list().await.unwrap();
        assert!(result.items.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_remove_duplicates_keeps_first_occurrence() {
        assert_eq!(
            remove_duplicates(&strings(&["b", "a", "b", "c", "a"])),
            strings(&["b", "a", "c"])
        );
        assert!(remove_duplicates(&[]).is_empty());
    }

    #[test]
    fn test_all_namespaces_enabled() {
        assert!(is_all_namespaces_enabled(None));
        assert!(is_all_namespaces_enabled(Some(&KubernetesConfig::default())));
        assert!(is_all_namespaces_enabled(Some(&KubernetesConfig {
            all_namespaces: Some("enabled".to_string()),
        })));
        assert!(!is_all_namespaces_enabled(Some(&KubernetesConfig {
            all_namespaces: Some("disabled".to_string()),
        })));
    }

    #[test]
    fn test_sort_stacks() {
        let mut stacks = vec![
            Stack::kubernetes("web", "prod", 1),
            Stack::kubernetes("api", "staging", 1),
            Stack::kubernetes("web", "dev", 1),
            Stack::kubernetes("api", "prod", 1),
        ];
        sort_stacks(&mut stacks);
        let order: Vec<(&str, &str)> = stacks
            .iter()
            .map(|s| (s.name.as_str(), s.namespace.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("api", "prod"), ("api", "staging"), ("web", "dev"), ("web", "prod")]
        );
    }
}

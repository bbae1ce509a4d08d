/// On-disk layout of the context store and CLI configuration
pub mod store {
    /// Configuration directory name (relative to HOME)
    pub const DIR_NAME: &str = ".ctxctl";

    /// CLI configuration file name inside the configuration directory
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Context store root directory inside the configuration directory
    pub const CONTEXTS_DIR: &str = "contexts";

    /// Metadata subtree of the context store
    pub const META_DIR: &str = "meta";

    /// TLS material subtree of the context store
    pub const TLS_DIR: &str = "tls";

    /// Metadata file name, both on disk and inside an export bundle
    pub const META_FILE: &str = "metadata.json";
}

/// Environment variables read by the binary
pub mod env {
    /// Overrides the configuration directory
    pub const CONFIG_DIR: &str = "CTXCTL_CONFIG";

    /// Selects the active context
    pub const CONTEXT: &str = "CTXCTL_CONTEXT";

    /// Ambient container engine endpoint
    pub const DOCKER_HOST: &str = "DOCKER_HOST";

    /// Ambient default stack orchestrator
    pub const STACK_ORCHESTRATOR: &str = "DOCKER_STACK_ORCHESTRATOR";

    /// Kubeconfig search path
    pub const KUBECONFIG: &str = "KUBECONFIG";
}

/// Default values
pub mod defaults {
    /// Default log level
    pub const LOG_LEVEL: &str = "warn";

    /// Reserved name meaning "no context, use ambient settings"
    pub const CONTEXT_NAME: &str = "default";

    /// Container engine endpoint used when nothing else is configured
    #[cfg(not(windows))]
    pub const DOCKER_HOST: &str = "unix:///var/run/docker.sock";

    /// Container engine endpoint used when nothing else is configured
    #[cfg(windows)]
    pub const DOCKER_HOST: &str = "npipe:////./pipe/docker_engine";

    /// Kubernetes namespace used when the kubeconfig names none
    pub const NAMESPACE: &str = "default";

    /// Kubeconfig path relative to HOME
    pub const KUBECONFIG_PATH: &str = ".kube/config";
}

/// TLS material file names shared by all endpoint kinds
pub mod tls {
    pub const CA_FILE: &str = "ca.pem";
    pub const CERT_FILE: &str = "cert.pem";
    pub const KEY_FILE: &str = "key.pem";
}

/// Namespace listing API exposed by some engine deployments
pub mod namespaces {
    /// Path queried on the engine host
    pub const API_PATH: &str = "/kubernetesNamespaces";

    /// Value of `kubernetes.allNamespaces` that restricts listing to namespaces
    pub const ALL_NAMESPACES_DISABLED: &str = "disabled";
}

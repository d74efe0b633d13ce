//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Upstream origin and routing protocol.
    pub proxy: UpstreamConfig,

    /// Remote applications mounted into pages.
    pub apps: Vec<AppDescriptor>,

    /// Import-map entries and bootstrap module.
    pub importmap: ImportMapConfig,

    /// Values published through the `kdex-ui` meta element.
    pub meta: MetaConfig,

    /// Navigation rendering.
    pub navigation: NavigationConfig,

    /// Transformer chain settings.
    pub transform: TransformConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Upstream origin and path-rewrite settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute upstream URL; its path becomes the prefix of every
    /// outbound path and its query is merged into every outbound query.
    pub upstream_address: String,

    /// Token separating the page path from the app-routing segment.
    pub path_separator: String,

    /// Append a trailing slash to the page path when a routing token is present.
    pub always_append_slash: bool,

    /// Append `index` to outbound paths ending in `/`.
    pub append_index: bool,

    /// Index filename used when `append_index` is set.
    pub index: String,

    /// Prefix aliases, checked in order.
    pub template_paths: Vec<TemplatePath>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            upstream_address: "http://127.0.0.1:8000".to_string(),
            path_separator: DEFAULT_PATH_SEPARATOR.to_string(),
            always_append_slash: false,
            append_index: false,
            index: "index.html".to_string(),
            template_paths: Vec::new(),
        }
    }
}

pub const DEFAULT_PATH_SEPARATOR: &str = "/_/";

/// A URL-prefix alias that rewrites to another upstream path and also
/// contributes a navigation entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TemplatePath {
    pub href: String,
    pub label: String,
    pub template: String,
    #[serde(default)]
    pub weight: f64,
}

/// A remote application that can be mounted into pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppDescriptor {
    /// Short identifier used in routed URLs; generated when empty.
    #[serde(default)]
    pub alias: String,

    /// `host:port` serving the app bundle.
    pub address: String,

    /// Custom element tag name.
    pub element: String,

    /// Bundle entry path on `address`.
    pub path: String,

    /// Pages the app mounts on.
    pub targets: Vec<AppTarget>,
}

/// Page an app mounts on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppTarget {
    pub path: String,
    #[serde(default)]
    pub container: String,
}

impl AppTarget {
    /// Container id to look up, `main` when unset.
    pub fn container_id(&self) -> &str {
        if self.container.is_empty() {
            DEFAULT_CONTAINER
        } else {
            &self.container
        }
    }

    /// Whether the default `<main>` fallback applies.
    pub fn uses_default_container(&self) -> bool {
        self.container.is_empty() || self.container == DEFAULT_CONTAINER
    }
}

pub const DEFAULT_CONTAINER: &str = "main";

const ALIAS_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ALIAS_LEN: usize = 4;

/// Generate a short random app alias from the given source.
pub fn random_alias<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ALIAS_LEN)
        .map(|_| ALIAS_ALPHABET[rng.gen_range(0..ALIAS_ALPHABET.len())] as char)
        .collect()
}

/// Import-map entries merged into every page.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ImportMapConfig {
    /// Module specifier → URL.
    pub module_imports: BTreeMap<String, String>,

    /// Inline bootstrap module appended to `<body>`; empty disables it.
    pub module_body: String,
}

/// Values published on the `kdex-ui` meta element.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MetaConfig {
    pub login_path: String,
    pub login_label: String,
    pub login_css_query: String,
    pub logout_path: String,
    pub logout_label: String,
    pub logout_css_query: String,
    pub state_endpoint: String,
    pub check_batch_endpoint: String,
    pub check_single_endpoint: String,
}

/// Navigation rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NavigationConfig {
    /// Selector locating navigation items; empty disables navigation.
    pub query: String,

    /// Fields extracted from each matched item.
    pub fields: BTreeMap<String, FieldQuery>,

    /// Markup rendered once per item, with `{{ field }}` placeholders.
    pub template: String,

    /// Path prefixes hidden from logged-out sessions.
    pub protected_paths: Vec<String>,
}

/// How one navigation field is read from an item element.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FieldQuery {
    /// Nested selector relative to the item; empty means the item itself.
    pub query: String,

    /// Attribute to read; empty means the element's text.
    pub attribute: String,
}

/// Kinds of document transformers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformerKind {
    Importmap,
    Apps,
    Meta,
    Navigation,
}

/// Transformer chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Transformers in execution order.
    pub chain: Vec<TransformerKind>,

    /// Largest upstream document buffered for rewriting.
    pub max_document_bytes: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            chain: vec![
                TransformerKind::Importmap,
                TransformerKind::Apps,
                TransformerKind::Meta,
                TransformerKind::Navigation,
            ],
            max_document_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

impl ProxyConfig {
    /// Give every app without an alias a random one.
    pub fn assign_missing_aliases<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for app in self.apps.iter_mut().filter(|app| app.alias.is_empty()) {
            app.alias = random_alias(rng);
            tracing::debug!(alias = %app.alias, element = %app.element, "Assigned generated app alias");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_alias_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let alias = random_alias(&mut rng);
        assert_eq!(alias.len(), 4);
        assert!(alias.bytes().all(|b| ALIAS_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_random_alias_is_seeded() {
        let a = random_alias(&mut StdRng::seed_from_u64(42));
        let b = random_alias(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_assign_missing_aliases_keeps_configured() {
        let mut config = ProxyConfig::default();
        config.apps.push(AppDescriptor {
            alias: "app1".into(),
            address: "localhost:1".into(),
            element: "app-one".into(),
            path: "/app1.js".into(),
            targets: vec![],
        });
        config.apps.push(AppDescriptor {
            alias: String::new(),
            ..config.apps[0].clone()
        });

        config.assign_missing_aliases(&mut StdRng::seed_from_u64(1));
        assert_eq!(config.apps[0].alias, "app1");
        assert_eq!(config.apps[1].alias.len(), 4);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [proxy]
            upstream_address = "http://origin:9000/site"

            [[apps]]
            alias = "app1"
            address = "localhost:61345"
            element = "app-one"
            path = "/app1.js"
            targets = [{ path = "/test/app1", container = "main" }]

            [importmap.module_imports]
            "@kdex-ui" = "/~/m/@kdex-ui/index.js"
            "#,
        )
        .unwrap();

        assert_eq!(config.proxy.path_separator, "/_/");
        assert_eq!(config.apps[0].targets[0].container_id(), "main");
        assert_eq!(config.transform.chain.len(), 4);
        assert_eq!(
            config.importmap.module_imports.get("@kdex-ui").map(String::as_str),
            Some("/~/m/@kdex-ui/index.js")
        );
    }

    #[test]
    fn test_default_container() {
        let target = AppTarget { path: "/a".into(), container: String::new() };
        assert_eq!(target.container_id(), "main");
        assert!(target.uses_default_container());

        let target = AppTarget { path: "/a".into(), container: "sidebar".into() };
        assert!(!target.uses_default_container());
    }
}

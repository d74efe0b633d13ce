//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce app descriptor validity (address, element, path, targets)
//! - Check the routing protocol settings (upstream URL, separator)
//! - Compile navigation selectors and templates ahead of traffic
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::dom::select::Selector;
use crate::transform::template::NavTemplate;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream address `{address}` is invalid: {reason}")]
    UpstreamAddress { address: String, reason: String },

    #[error("path separator `{0}` must be non-empty and start and end with `/`")]
    PathSeparator(String),

    #[error("app #{index}: {reason}")]
    App { index: usize, reason: String },

    #[error("app alias `{0}` is used more than once")]
    DuplicateAlias(String),

    #[error("template path `{href}`: {reason}")]
    TemplatePath { href: String, reason: String },

    #[error("navigation: {0}")]
    Navigation(String),

    #[error("transformer `{0}` appears more than once in the chain")]
    DuplicateTransformer(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_upstream(config, &mut errors);
    validate_apps(config, &mut errors);
    validate_navigation(config, &mut errors);

    let mut seen = HashSet::new();
    for kind in &config.transform.chain {
        if !seen.insert(*kind) {
            errors.push(ValidationError::DuplicateTransformer(format!("{:?}", kind).to_lowercase()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let proxy = &config.proxy;
    match url::Url::parse(&proxy.upstream_address) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::UpstreamAddress {
                address: proxy.upstream_address.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::UpstreamAddress {
                address: proxy.upstream_address.clone(),
                reason: "missing host".to_string(),
            });
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::UpstreamAddress {
            address: proxy.upstream_address.clone(),
            reason: e.to_string(),
        }),
    }

    let sep = &proxy.path_separator;
    if sep.is_empty() || !sep.starts_with('/') || !sep.ends_with('/') || sep == "/" {
        errors.push(ValidationError::PathSeparator(sep.clone()));
    }

    for tp in &proxy.template_paths {
        if !tp.href.starts_with('/') || !tp.template.starts_with('/') {
            errors.push(ValidationError::TemplatePath {
                href: tp.href.clone(),
                reason: "href and template must begin with `/`".to_string(),
            });
        }
    }
}

fn validate_apps(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let mut aliases = HashSet::new();

    for (index, app) in config.apps.iter().enumerate() {
        let mut fail = |reason: &str| {
            errors.push(ValidationError::App { index, reason: reason.to_string() });
        };

        if app.address.is_empty() {
            fail("address is required");
        }
        if app.element.is_empty() {
            fail("element is required");
        }
        if app.path.is_empty() {
            fail("path is required");
        }
        if app.targets.is_empty() {
            fail("at least one target is required");
        }
        if app.targets.iter().any(|t| t.path.is_empty()) {
            fail("every target needs a path");
        }

        if !app.alias.is_empty() && !aliases.insert(app.alias.as_str()) {
            errors.push(ValidationError::DuplicateAlias(app.alias.clone()));
        }
    }
}

fn validate_navigation(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let nav = &config.navigation;
    if nav.query.is_empty() {
        return;
    }

    if let Err(e) = Selector::parse(&nav.query) {
        errors.push(ValidationError::Navigation(format!("query: {}", e)));
    }
    for (name, field) in &nav.fields {
        if field.query.is_empty() {
            continue;
        }
        if let Err(e) = Selector::parse(&field.query) {
            errors.push(ValidationError::Navigation(format!("field `{}`: {}", name, e)));
        }
    }
    if let Err(e) = NavTemplate::parse(&nav.template) {
        errors.push(ValidationError::Navigation(format!("template: {}", e)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AppDescriptor, AppTarget, FieldQuery, TransformerKind};

    fn app(alias: &str) -> AppDescriptor {
        AppDescriptor {
            alias: alias.into(),
            address: "localhost:61345".into(),
            element: "app-one".into(),
            path: "/app1.js".into(),
            targets: vec![AppTarget { path: "/test/app1".into(), container: "main".into() }],
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ProxyConfig::default();
        config.proxy.upstream_address = "not a url".into();
        config.proxy.path_separator = "_".into();
        config.apps.push(AppDescriptor { address: String::new(), targets: vec![], ..app("a") });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UpstreamAddress { .. })));
        assert!(errors.contains(&ValidationError::PathSeparator("_".into())));
        let app_errors = errors.iter().filter(|e| matches!(e, ValidationError::App { .. })).count();
        assert_eq!(app_errors, 2);
    }

    #[test]
    fn test_target_without_path() {
        let mut config = ProxyConfig::default();
        let mut bad = app("a");
        bad.targets.push(AppTarget { path: String::new(), container: String::new() });
        config.apps.push(bad);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::App { index: 0, reason: "every target needs a path".into() }]
        );
    }

    #[test]
    fn test_duplicate_alias() {
        let mut config = ProxyConfig::default();
        config.apps.push(app("dup"));
        config.apps.push(app("dup"));
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::DuplicateAlias("dup".into())]
        );
    }

    #[test]
    fn test_navigation_selectors_compiled() {
        let mut config = ProxyConfig::default();
        config.navigation.query = "nav li[".into();
        config.navigation.template = "<li>{{ label".into();
        config.navigation.fields.insert(
            "href".into(),
            FieldQuery { query: "a".into(), attribute: "href".into() },
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_duplicate_transformer() {
        let mut config = ProxyConfig::default();
        config.transform.chain.push(TransformerKind::Meta);
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::DuplicateTransformer("meta".into())]
        );
    }
}

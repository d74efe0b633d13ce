//! Import-map merging.
//!
//! Ensures the page has a `<script type="importmap">`, merges configured
//! module specifiers into it and optionally appends an inline bootstrap
//! module to `<body>`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::ImportMapConfig;
use crate::dom::{query, Document};
use crate::transform::{is_html, Exchange, TransformError, Transformer};

const NAME: &str = "importmap";

#[derive(Debug, Error)]
pub enum ImportMapError {
    #[error("invalid import map JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The `imports` / `integrity` / `scopes` table of a browser import map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "BTreeMap::is_empty")]
    pub imports: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "BTreeMap::is_empty")]
    pub integrity: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "BTreeMap::is_empty")]
    pub scopes: BTreeMap<String, BTreeMap<String, String>>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ImportMap {
    /// Parse the text of an import-map script; blank text is an empty map.
    pub fn parse(text: &str) -> Result<Self, ImportMapError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Add `entries` to `imports`; configured entries win on collision.
    pub fn merge_imports(&mut self, entries: &BTreeMap<String, String>) {
        for (specifier, url) in entries {
            self.imports.insert(specifier.clone(), url.clone());
        }
    }

    /// Merge another map into this one; `other` wins on collision.
    pub fn merge(&mut self, other: &ImportMap) {
        self.merge_imports(&other.imports);
        for (specifier, hash) in &other.integrity {
            self.integrity.insert(specifier.clone(), hash.clone());
        }
        for (scope, entries) in &other.scopes {
            let target = self.scopes.entry(scope.clone()).or_default();
            for (specifier, url) in entries {
                target.insert(specifier.clone(), url.clone());
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ImportMapError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Merges configured modules into the page's import map.
#[derive(Debug, Clone)]
pub struct ImportMapTransformer {
    imports: BTreeMap<String, String>,
    module_body: String,
}

impl ImportMapTransformer {
    pub fn new(config: &ImportMapConfig) -> Self {
        Self {
            imports: config.module_imports.clone(),
            module_body: config.module_body.clone(),
        }
    }
}

impl Transformer for ImportMapTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn should_transform(&self, exchange: &Exchange<'_>) -> bool {
        is_html(exchange.headers) && (!self.imports.is_empty() || !self.module_body.is_empty())
    }

    fn transform(&self, _exchange: &Exchange<'_>, doc: &mut Document) -> Result<(), TransformError> {
        let root = doc.root();
        let existing = query::find_element_by_name_where(doc, "script", root, |e| {
            e.attr("type") == Some("importmap")
        });

        let script = match existing {
            Some(script) => script,
            None => {
                let head = query::head(doc)
                    .ok_or_else(|| TransformError::transformer(NAME, "document has no <head>"))?;
                let script = doc.create_element("script", &[("type", "importmap")]);
                doc.prepend_child(head, script);
                script
            }
        };

        let mut import_map = ImportMap::parse(&query::collect_text(doc, script))
            .map_err(|e| TransformError::transformer(NAME, e))?;
        import_map.merge_imports(&self.imports);

        let json = import_map
            .to_json()
            .map_err(|e| TransformError::transformer(NAME, e))?;
        doc.set_text(script, &json);

        if !self.module_body.is_empty() {
            match query::body(doc) {
                Some(body) => {
                    let module = doc.create_element("script", &[("type", "module")]);
                    doc.append_text(module, &self.module_body);
                    doc.append_child(body, module);
                }
                None => tracing::warn!("No <body> for the bootstrap module; skipping it"),
            }
        }

        Ok(())
    }
}

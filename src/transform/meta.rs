//! Publishes gateway settings to client code via `<meta name="kdex-ui">`.

use crate::config::MetaConfig;
use crate::dom::{query, Document};
use crate::transform::{is_html, Exchange, TransformError, Transformer};

#[derive(Debug, Clone)]
pub struct MetaTransformer {
    path_separator: String,
    meta: MetaConfig,
}

impl MetaTransformer {
    pub fn new(path_separator: &str, meta: &MetaConfig) -> Self {
        Self {
            path_separator: path_separator.to_string(),
            meta: meta.clone(),
        }
    }

    fn attributes(&self) -> [(&'static str, &str); 11] {
        let m = &self.meta;
        [
            ("name", "kdex-ui"),
            ("data-path-separator", &self.path_separator),
            ("data-login-path", &m.login_path),
            ("data-login-label", &m.login_label),
            ("data-login-css-query", &m.login_css_query),
            ("data-logout-path", &m.logout_path),
            ("data-logout-label", &m.logout_label),
            ("data-logout-css-query", &m.logout_css_query),
            ("data-state-endpoint", &m.state_endpoint),
            ("data-check-batch-endpoint", &m.check_batch_endpoint),
            ("data-check-single-endpoint", &m.check_single_endpoint),
        ]
    }
}

impl Transformer for MetaTransformer {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn should_transform(&self, exchange: &Exchange<'_>) -> bool {
        is_html(exchange.headers)
    }

    fn transform(&self, _exchange: &Exchange<'_>, doc: &mut Document) -> Result<(), TransformError> {
        let Some(head) = query::head(doc) else {
            return Ok(());
        };
        let meta = doc.create_element("meta", &self.attributes());
        doc.append_child(head, meta);
        Ok(())
    }
}

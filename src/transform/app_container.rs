//! Mounts registered apps into the pages they target.

use crate::config::{AppDescriptor, AppTarget};
use crate::dom::{query, Document, NodeId};
use crate::http::headers::{X_KDEX_PROXY_APP_ALIAS, X_KDEX_PROXY_APP_PATH};
use crate::routing::path::join_paths;
use crate::transform::{is_html, Exchange, TransformError, Transformer};

const NAME: &str = "apps";

#[derive(Debug, Clone)]
pub struct AppContainerTransformer {
    apps: Vec<AppDescriptor>,
}

impl AppContainerTransformer {
    pub fn new(apps: &[AppDescriptor]) -> Self {
        Self { apps: apps.to_vec() }
    }

    fn container(doc: &Document, target: &AppTarget) -> Option<NodeId> {
        let root = doc.root();
        query::find_element_by_id(doc, target.container_id(), root).or_else(|| {
            target
                .uses_default_container()
                .then(|| query::find_element_by_name(doc, "main", root))
                .flatten()
        })
    }
}

fn trim_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

impl Transformer for AppContainerTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn should_transform(&self, exchange: &Exchange<'_>) -> bool {
        !self.apps.is_empty() && is_html(exchange.headers)
    }

    fn transform(&self, exchange: &Exchange<'_>, doc: &mut Document) -> Result<(), TransformError> {
        let page = trim_slash(&exchange.request.routing.proxied_path);
        let routed_alias = exchange.request.header(X_KDEX_PROXY_APP_ALIAS.as_str());
        let routed_path = exchange.request.header(X_KDEX_PROXY_APP_PATH.as_str());

        for app in &self.apps {
            let Some(target) = app.targets.iter().find(|t| trim_slash(&t.path) == page) else {
                continue;
            };
            let Some(container) = Self::container(doc, target) else {
                tracing::warn!(
                    app = %app.alias,
                    container = %target.container_id(),
                    page = %page,
                    "App container not found; skipping app"
                );
                continue;
            };

            doc.remove_children(container);
            let element = doc.create_element(&app.element, &[("id", app.alias.as_str())]);
            if routed_alias == app.alias && !routed_path.is_empty() {
                if let Some(data) = doc.element_mut(element) {
                    data.set_attr("route-path", routed_path);
                }
            }
            doc.append_child(container, element);

            let Some(body) = query::body(doc) else {
                tracing::warn!(app = %app.alias, "No <body> for the app bootstrap script");
                continue;
            };
            let src = join_paths(&format!("http://{}", app.address), &app.path);
            let script = doc.create_element("script", &[("type", "module"), ("src", src.as_str())]);
            doc.append_child(body, script);

            tracing::debug!(app = %app.alias, element = %app.element, page = %page, "Mounted app");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing;
    use axum::http::HeaderValue;

    fn app_one(container: &str) -> AppDescriptor {
        AppDescriptor {
            alias: "app1".into(),
            address: "localhost:61345".into(),
            element: "app-one".into(),
            path: "/app1.js".into(),
            targets: vec![AppTarget {
                path: "/test/app1".into(),
                container: container.into(),
            }],
        }
    }

    const PAGE: &str = "<html><head></head><body><main></main></body></html>";

    #[test]
    fn test_mounts_into_default_container() {
        let transformer = AppContainerTransformer::new(&[app_one("main")]);
        let out = testing::apply(&transformer, &testing::request("/test/app1"), PAGE);
        assert_eq!(
            out,
            concat!(
                r#"<html><head></head><body><main><app-one id="app1"></app-one></main>"#,
                r#"<script type="module" src="http://localhost:61345/app1.js"></script></body></html>"#
            )
        );
    }

    #[test]
    fn test_route_path_for_routed_app() {
        let transformer = AppContainerTransformer::new(&[app_one("")]);
        let mut request = testing::request("/test/app1/");
        request
            .headers
            .insert(X_KDEX_PROXY_APP_ALIAS, HeaderValue::from_static("app1"));
        request
            .headers
            .insert(X_KDEX_PROXY_APP_PATH, HeaderValue::from_static("/bar"));

        let out = testing::apply(&transformer, &request, PAGE);
        assert!(out.contains(r#"<main><app-one id="app1" route-path="/bar"></app-one></main>"#));
    }

    #[test]
    fn test_route_path_requires_matching_alias() {
        let transformer = AppContainerTransformer::new(&[app_one("main")]);
        let mut request = testing::request("/test/app1");
        request
            .headers
            .insert(X_KDEX_PROXY_APP_ALIAS, HeaderValue::from_static("other"));
        request
            .headers
            .insert(X_KDEX_PROXY_APP_PATH, HeaderValue::from_static("/bar"));

        let out = testing::apply(&transformer, &request, PAGE);
        assert!(!out.contains("route-path"));
    }

    #[test]
    fn test_container_by_id_replaces_children() {
        let transformer = AppContainerTransformer::new(&[app_one("slot")]);
        let out = testing::apply(
            &transformer,
            &testing::request("/test/app1"),
            r#"<html><head></head><body><main></main><div id="slot"><p>old</p></div></body></html>"#,
        );
        assert!(out.contains(r#"<main></main><div id="slot"><app-one id="app1"></app-one></div>"#));
    }

    #[test]
    fn test_missing_container_is_skipped() {
        let transformer = AppContainerTransformer::new(&[app_one("slot")]);
        let out = testing::apply(&transformer, &testing::request("/test/app1"), PAGE);
        assert_eq!(out, PAGE);
    }

    #[test]
    fn test_other_pages_untouched() {
        let transformer = AppContainerTransformer::new(&[app_one("main")]);
        let out = testing::apply(&transformer, &testing::request("/elsewhere"), PAGE);
        assert_eq!(out, PAGE);
    }
}

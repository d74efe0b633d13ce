//! Navigation re-rendering.
//!
//! Items are read from the page with a selector, extended with configured
//! template paths, filtered for the session, sorted by weight and rendered
//! back in place of the originals.

use std::collections::BTreeMap;

use crate::config::{FieldQuery, NavigationConfig, TemplatePath};
use crate::dom::{parse_fragment, query, Document, NodeId, Selector};
use crate::transform::chain::BuildError;
use crate::transform::template::NavTemplate;
use crate::transform::{is_html, Exchange, TransformError, Transformer};

/// One navigation entry, built per request.
#[derive(Debug, Clone, PartialEq)]
pub struct NavItem {
    pub href: String,
    pub label: String,
    pub weight: f64,
    /// Every extracted field, `href`/`label`/`weight` included.
    pub fields: BTreeMap<String, String>,
}

impl NavItem {
    fn from_fields(fields: BTreeMap<String, String>) -> Self {
        let get = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            href: get("href"),
            label: get("label"),
            weight: fields
                .get("weight")
                .and_then(|w| w.trim().parse().ok())
                .unwrap_or(0.0),
            fields,
        }
    }

    fn from_template_path(path: &TemplatePath) -> Self {
        let fields = BTreeMap::from([
            ("href".to_string(), path.href.clone()),
            ("label".to_string(), path.label.clone()),
            ("weight".to_string(), path.weight.to_string()),
        ]);
        Self {
            href: path.href.clone(),
            label: path.label.clone(),
            weight: path.weight,
            fields,
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    query: Option<Selector>,
    attribute: Option<String>,
}

impl Field {
    fn compile(name: &str, config: &FieldQuery) -> Result<Self, BuildError> {
        let query = if config.query.trim().is_empty() {
            None
        } else {
            Some(Selector::parse(&config.query)?)
        };
        Ok(Self {
            name: name.to_string(),
            query,
            attribute: (!config.attribute.is_empty()).then(|| config.attribute.clone()),
        })
    }

    fn extract(&self, doc: &Document, item: NodeId) -> String {
        let node = match &self.query {
            Some(query) => match query.select_first(doc, item) {
                Some(node) => node,
                None => return String::new(),
            },
            None => item,
        };
        match &self.attribute {
            Some(attribute) => doc
                .element(node)
                .and_then(|e| e.attr(attribute))
                .unwrap_or_default()
                .to_string(),
            None => query::collect_text(doc, node).trim().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Compiled {
    query: Selector,
    fields: Vec<Field>,
    template: NavTemplate,
}

#[derive(Debug, Clone)]
pub struct NavigationTransformer {
    compiled: Option<Compiled>,
    template_paths: Vec<TemplatePath>,
    protected_paths: Vec<String>,
}

impl NavigationTransformer {
    /// Compile the configured selectors and template. An empty query
    /// yields a transformer that never runs.
    pub fn new(config: &NavigationConfig, template_paths: &[TemplatePath]) -> Result<Self, BuildError> {
        let compiled = if config.query.trim().is_empty() {
            None
        } else {
            Some(Compiled {
                query: Selector::parse(&config.query)?,
                fields: config
                    .fields
                    .iter()
                    .map(|(name, field)| Field::compile(name, field))
                    .collect::<Result<_, _>>()?,
                template: NavTemplate::parse(&config.template)?,
            })
        };

        Ok(Self {
            compiled,
            template_paths: template_paths.to_vec(),
            protected_paths: config.protected_paths.clone(),
        })
    }

    fn is_protected(&self, href: &str) -> bool {
        self.protected_paths
            .iter()
            .any(|prefix| !prefix.is_empty() && href.starts_with(prefix.as_str()))
    }

    /// Items for this page: extracted, extended, filtered and sorted.
    fn items(&self, compiled: &Compiled, doc: &Document, matches: &[NodeId], logged_in: bool) -> Vec<NavItem> {
        let mut items: Vec<NavItem> = matches
            .iter()
            .map(|&node| {
                NavItem::from_fields(
                    compiled
                        .fields
                        .iter()
                        .map(|f| (f.name.clone(), f.extract(doc, node)))
                        .collect(),
                )
            })
            .chain(self.template_paths.iter().map(NavItem::from_template_path))
            .filter(|item| logged_in || !self.is_protected(&item.href))
            .collect();

        // sort_by is stable; equal weights keep insertion order
        items.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        items
    }
}

impl Transformer for NavigationTransformer {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn should_transform(&self, exchange: &Exchange<'_>) -> bool {
        self.compiled.is_some() && is_html(exchange.headers)
    }

    fn transform(&self, exchange: &Exchange<'_>, doc: &mut Document) -> Result<(), TransformError> {
        let Some(compiled) = &self.compiled else {
            return Ok(());
        };

        let matches = compiled.query.select_all(doc, doc.root());
        let Some(&first) = matches.first() else {
            return Ok(());
        };

        let items = self.items(compiled, doc, &matches, exchange.request.session.logged_in);
        let markup: String = items
            .iter()
            .map(|item| compiled.template.render(&item.fields))
            .collect();

        let context = doc
            .parent(first)
            .and_then(|p| doc.element(p))
            .map(|e| e.tag().to_string())
            .unwrap_or_else(|| "body".to_string());
        let (fragment, nodes) = parse_fragment(&markup, &context);

        for node in nodes {
            let copy = doc.import(&fragment, node);
            doc.insert_before(first, copy);
        }
        for node in matches {
            doc.detach(node);
        }

        tracing::debug!(items = items.len(), "Rendered navigation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing;

    fn field(query: &str, attribute: &str) -> FieldQuery {
        FieldQuery {
            query: query.into(),
            attribute: attribute.into(),
        }
    }

    fn config() -> NavigationConfig {
        NavigationConfig {
            query: "ul.nav > li".into(),
            fields: BTreeMap::from([
                ("href".to_string(), field("a", "href")),
                ("label".to_string(), field("a", "")),
                ("weight".to_string(), field("", "data-weight")),
            ]),
            template: r#"<li><a href="{{ href }}">{{ label }}</a></li>"#.into(),
            protected_paths: vec!["/admin".into()],
        }
    }

    fn page(items: &str) -> String {
        format!(
            r#"<html><head></head><body><ul class="nav">{}</ul></body></html>"#,
            items
        )
    }

    #[test]
    fn test_items_sorted_by_weight() {
        let nav = NavigationTransformer::new(&config(), &[]).unwrap();
        let out = testing::apply(
            &nav,
            &testing::request("/"),
            &page(concat!(
                r#"<li data-weight="3"><a href="/c">C</a></li>"#,
                r#"<li data-weight="1"><a href="/a">A</a></li>"#,
                r#"<li><a href="/z"> Z </a></li>"#,
            )),
        );
        assert_eq!(
            out,
            page(r#"<li><a href="/z">Z</a></li><li><a href="/a">A</a></li><li><a href="/c">C</a></li>"#)
        );
    }

    #[test]
    fn test_equal_weights_keep_order() {
        let nav = NavigationTransformer::new(&config(), &[]).unwrap();
        let out = testing::apply(
            &nav,
            &testing::request("/"),
            &page(concat!(
                r#"<li data-weight="1"><a href="/b">B</a></li>"#,
                r#"<li data-weight="1"><a href="/a">A</a></li>"#,
                r#"<li data-weight="0.5"><a href="/x">X</a></li>"#,
            )),
        );
        assert_eq!(
            out,
            page(r#"<li><a href="/x">X</a></li><li><a href="/b">B</a></li><li><a href="/a">A</a></li>"#)
        );
    }

    #[test]
    fn test_template_paths_are_added() {
        let docs = TemplatePath {
            href: "/docs".into(),
            label: "Docs".into(),
            template: "/templates/doc".into(),
            weight: 2.0,
        };
        let nav = NavigationTransformer::new(&config(), &[docs]).unwrap();
        let out = testing::apply(
            &nav,
            &testing::request("/"),
            &page(r#"<li data-weight="5"><a href="/e">E</a></li><li data-weight="1"><a href="/a">A</a></li>"#),
        );
        assert_eq!(
            out,
            page(r#"<li><a href="/a">A</a></li><li><a href="/docs">Docs</a></li><li><a href="/e">E</a></li>"#)
        );
    }

    #[test]
    fn test_protected_paths_hidden_when_logged_out() {
        let nav = NavigationTransformer::new(&config(), &[]).unwrap();
        let html = page(r#"<li><a href="/admin/users">Users</a></li><li><a href="/home">Home</a></li>"#);

        let out = testing::apply(&nav, &testing::request("/"), &html);
        assert_eq!(out, page(r#"<li><a href="/home">Home</a></li>"#));

        let mut request = testing::request("/");
        request.session.logged_in = true;
        let out = testing::apply(&nav, &request, &html);
        assert_eq!(
            out,
            page(r#"<li><a href="/admin/users">Users</a></li><li><a href="/home">Home</a></li>"#)
        );
    }

    #[test]
    fn test_no_matches_is_noop() {
        let nav = NavigationTransformer::new(&config(), &[]).unwrap();
        let html = "<html><head></head><body><p>plain</p></body></html>";
        assert_eq!(testing::apply(&nav, &testing::request("/"), html), html);
    }

    #[test]
    fn test_empty_query_disables() {
        let nav = NavigationTransformer::new(&NavigationConfig::default(), &[]).unwrap();
        let request = testing::request("/");
        let headers = testing::html_headers();
        let exchange = Exchange {
            request: &request,
            status: axum::http::StatusCode::OK,
            headers: &headers,
        };
        assert!(!nav.should_transform(&exchange));
    }

    #[test]
    fn test_bad_selector_fails_build() {
        let mut bad = config();
        bad.query = "ul >".into();
        assert!(matches!(
            NavigationTransformer::new(&bad, &[]),
            Err(BuildError::Selector(_))
        ));
    }
}

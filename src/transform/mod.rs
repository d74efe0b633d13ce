//! Document transformation subsystem.
//!
//! # Data Flow
//! ```text
//! buffered HTML response (see http::response)
//!     → chain.rs (ordered transformers, each gated by should_transform)
//!         → importmap.rs     (merge <script type="importmap">, bootstrap module)
//!         → app_container.rs (mount custom elements for apps on this page)
//!         → meta.rs          (<meta name="kdex-ui"> settings)
//!         → navigation.rs    (re-render navigation items via template.rs)
//!     → mutated Document
//! ```
//!
//! # Design Decisions
//! - Transformers are independent values behind one trait
//! - All transformers share one live Document; later ones see earlier edits
//! - Order is configuration; the chain itself runs strictly in sequence
//! - The first error aborts the rest of the chain

use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use thiserror::Error;

use crate::dom::Document;
use crate::routing::RoutingContext;
use crate::session::Session;

pub mod app_container;
pub mod chain;
pub mod importmap;
pub mod meta;
pub mod navigation;
pub mod template;

pub use app_container::AppContainerTransformer;
pub use chain::{BuildError, TransformerChain};
pub use importmap::{ImportMap, ImportMapError, ImportMapTransformer};
pub use meta::MetaTransformer;
pub use navigation::{NavItem, NavigationTransformer};

/// Errors that abort a transformed response.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Upstream body could not be read or exceeded the buffer limit.
    #[error("failed to read upstream body: {0}")]
    Body(String),

    /// Buffered body could not be parsed.
    #[error("failed to parse upstream document: {0}")]
    Parse(#[source] std::io::Error),

    /// A transformer rejected the document.
    #[error("transformer `{name}` failed: {reason}")]
    Transformer { name: &'static str, reason: String },

    /// Mutated document could not be rendered.
    #[error("failed to serialize document: {0}")]
    Serialize(#[source] std::io::Error),
}

impl TransformError {
    pub fn transformer(name: &'static str, reason: impl ToString) -> Self {
        Self::Transformer {
            name,
            reason: reason.to_string(),
        }
    }
}

/// Snapshot of the request as it was sent upstream.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub routing: RoutingContext,
    pub session: Session,
}

impl ProxiedRequest {
    /// Header value as text, empty when missing or not visible ASCII.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// The response a transformer is looking at.
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub request: &'a ProxiedRequest,
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
}

/// One document mutation pass.
pub trait Transformer: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Decide from headers alone whether this transformer runs.
    fn should_transform(&self, exchange: &Exchange<'_>) -> bool;

    /// Mutate `doc` in place. Must not keep references past the call.
    fn transform(&self, exchange: &Exchange<'_>, doc: &mut Document) -> Result<(), TransformError>;
}

/// Whether the response declares an HTML body.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CONTENT_TYPE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/html"))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by transformer tests.

    use super::*;
    use crate::dom::{parse_document, serialize_document};
    use axum::http::HeaderValue;

    pub fn request(path: &str) -> ProxiedRequest {
        ProxiedRequest {
            method: Method::GET,
            uri: path.parse().unwrap(),
            headers: HeaderMap::new(),
            routing: RoutingContext {
                proxied_path: path.to_string(),
                ..RoutingContext::default()
            },
            session: Session::anonymous(),
        }
    }

    pub fn html_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        headers
    }

    pub fn parse(html: &str) -> Document {
        parse_document(&mut html.as_bytes()).unwrap()
    }

    pub fn render(doc: &Document) -> String {
        String::from_utf8(serialize_document(doc).unwrap()).unwrap()
    }

    /// Run `transformer` against `html` and return the serialized result.
    pub fn apply(transformer: &dyn Transformer, request: &ProxiedRequest, html: &str) -> String {
        let headers = html_headers();
        let exchange = Exchange {
            request,
            status: StatusCode::OK,
            headers: &headers,
        };
        assert!(transformer.should_transform(&exchange));
        let mut doc = parse(html);
        transformer.transform(&exchange, &mut doc).unwrap();
        render(&doc)
    }
}

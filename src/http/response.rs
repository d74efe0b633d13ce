//! Response transformation driver.
//!
//! # Responsibilities
//! - Decide from headers whether a response is rewritten
//! - Buffer, parse, transform and re-serialize eligible documents
//! - Recompute `Content-Length` for the rewritten body
//!
//! # Design Decisions
//! - Ineligible responses stream through untouched
//! - Once buffering starts the tree is the source of truth; any failure
//!   fails the response instead of falling back to the original bytes

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Response, StatusCode};

use crate::dom::{parse_document, serialize_document};
use crate::transform::{is_html, Exchange, ProxiedRequest, TransformError, TransformerChain};

/// Runs the transformer chain over buffered HTML responses.
#[derive(Debug)]
pub struct TransformationDriver {
    chain: TransformerChain,
    max_document_bytes: usize,
}

impl TransformationDriver {
    pub fn new(chain: TransformerChain, max_document_bytes: usize) -> Self {
        Self {
            chain,
            max_document_bytes,
        }
    }

    pub fn chain(&self) -> &TransformerChain {
        &self.chain
    }

    /// HTML and not chunked.
    pub fn is_transformable(headers: &HeaderMap) -> bool {
        is_html(headers) && !is_chunked(headers)
    }

    /// Whether [`process`](Self::process) rewrites a response with `status`
    /// and `headers` to a `method` request.
    pub fn should_transform(method: &Method, status: StatusCode, headers: &HeaderMap) -> bool {
        *method != Method::HEAD
            && can_carry_body(status)
            && Self::is_transformable(headers)
            && content_encoding(headers).is_none()
    }

    /// Rewrite `response` if eligible, otherwise return it unchanged.
    pub async fn process(
        &self,
        request: &ProxiedRequest,
        response: Response<Body>,
    ) -> Result<Response<Body>, TransformError> {
        if !Self::should_transform(&request.method, response.status(), response.headers()) {
            let headers = response.headers();
            if let Some(encoding) = content_encoding(headers).filter(|_| is_html(headers)) {
                tracing::warn!(encoding = %encoding, "Encoded HTML response; passing through");
            }
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, self.max_document_bytes)
            .await
            .map_err(|e| TransformError::Body(e.to_string()))?;

        let exchange = Exchange {
            request,
            status: parts.status,
            headers: &parts.headers,
        };
        let rendered = self.transform_document(&exchange, &bytes)?;

        tracing::debug!(
            original_bytes = bytes.len(),
            rendered_bytes = rendered.len(),
            "Transformed document"
        );

        parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(rendered.len()));
        Ok(Response::from_parts(parts, Body::from(rendered)))
    }

    /// Parse, transform and serialize one buffered document.
    pub fn transform_document(
        &self,
        exchange: &Exchange<'_>,
        mut bytes: &[u8],
    ) -> Result<Vec<u8>, TransformError> {
        let mut doc = parse_document(&mut bytes).map_err(TransformError::Parse)?;
        self.chain.run(exchange, &mut doc)?;
        serialize_document(&doc).map_err(TransformError::Serialize)
    }
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("chunked"))
}

fn can_carry_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

fn content_encoding(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("identity"))
}

//! Path rewrite engine.
//!
//! # Responsibilities
//! - Decode the routing token from the inbound path
//! - Compute the upstream URL (scheme, host, path, query)
//! - Apply template-path aliasing
//! - Set forwarding headers and attach the routing context
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - The readable and percent-escaped paths go through the same steps
//! - Malformed routing tokens degrade to "no token", never to an error

use std::net::IpAddr;
use std::str::FromStr;

use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::uri::{Authority, Uri};
use axum::http::{request, HeaderMap};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::routing::matcher::TemplateMatcher;
use crate::routing::path::{append_index, join_paths, merge_query};
use crate::routing::token::{decode, split_token, RoutingContext};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_PORT: HeaderName = HeaderName::from_static("x-forwarded-port");
pub const FORWARDED: HeaderName = HeaderName::from_static("forwarded");

/// Characters escaped when a readable path has to be re-encoded.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Errors building the upstream target.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid upstream address `{address}`: {reason}")]
    Upstream { address: String, reason: String },

    #[error("invalid upstream uri `{uri}`: {source}")]
    Uri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

/// Outbound location computed for one request.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    /// Full outbound URI.
    pub uri: Uri,
    /// Human-readable outbound path.
    pub path: String,
    /// Percent-escaped outbound path, as sent.
    pub raw_path: String,
    /// Merged query string, without `?`.
    pub query: String,
    /// Routing decision decoded from the inbound path.
    pub routing: RoutingContext,
}

/// Computes outbound requests against the single upstream origin.
#[derive(Debug, Clone)]
pub struct PathRewriter {
    scheme: String,
    authority: String,
    prefix: String,
    raw_prefix: String,
    query: String,
    separator: String,
    always_append_slash: bool,
    index: Option<String>,
    templates: TemplateMatcher,
}

impl PathRewriter {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, RewriteError> {
        let upstream_err = |reason: String| RewriteError::Upstream {
            address: config.upstream_address.clone(),
            reason,
        };

        let url = url::Url::parse(&config.upstream_address).map_err(|e| upstream_err(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| upstream_err("missing host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            authority,
            prefix: percent_decode_str(url.path()).decode_utf8_lossy().into_owned(),
            raw_prefix: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
            separator: config.path_separator.clone(),
            always_append_slash: config.always_append_slash,
            index: (config.append_index && !config.index.is_empty()).then(|| config.index.clone()),
            templates: TemplateMatcher::from_config(&config.template_paths),
        })
    }

    /// Upstream `host[:port]`.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Compute the upstream target for an inbound URI.
    pub fn target(&self, inbound: &Uri) -> Result<UpstreamTarget, RewriteError> {
        let raw_inbound = inbound.path();
        let inbound_path = percent_decode_str(raw_inbound).decode_utf8_lossy();

        let routing = decode(&inbound_path, &self.separator, self.always_append_slash);
        let path = self.outbound_path(&inbound_path, &self.prefix);
        let mut raw_path = self.outbound_path(raw_inbound, &self.raw_prefix);
        // Escaped separators only split the readable path.
        if percent_decode_str(&raw_path).decode_utf8_lossy() != path {
            raw_path = utf8_percent_encode(&path, PATH).to_string();
        }
        let query = merge_query(&self.query, inbound.query().unwrap_or_default());

        let mut uri = format!("{}://{}{}", self.scheme, self.authority, raw_path);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }
        let uri = uri
            .parse::<Uri>()
            .map_err(|source| RewriteError::Uri { uri, source })?;

        Ok(UpstreamTarget { uri, path, raw_path, query, routing })
    }

    fn outbound_path(&self, path: &str, prefix: &str) -> String {
        let candidate = split_token(path, &self.separator, self.always_append_slash).page;
        let candidate = self
            .templates
            .rewrite(&candidate)
            .unwrap_or_else(|| candidate.into_owned());

        let joined = join_paths(prefix, &candidate);
        match &self.index {
            Some(index) => append_index(joined, index),
            None => joined,
        }
    }

    /// Rewrite `parts` in place to target the upstream.
    ///
    /// `client` is the peer address, used for `X-Forwarded-For` only when the
    /// inbound request carries none. `egress` is this host's outbound address.
    pub fn rewrite(
        &self,
        parts: &mut request::Parts,
        client: Option<IpAddr>,
        egress: IpAddr,
    ) -> Result<RoutingContext, RewriteError> {
        let target = self.target(&parts.uri)?;

        tracing::debug!(
            inbound = %parts.uri,
            upstream = %target.uri,
            path = %target.path,
            proxied_path = %target.routing.proxied_path,
            app_alias = %target.routing.app_alias,
            app_path = %target.routing.app_path,
            "Rewrote request path"
        );

        let inbound_host = parts
            .headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();
        let inbound_scheme = parts.uri.scheme_str().unwrap_or("http").to_string();

        set_forwarding_headers(&mut parts.headers, &inbound_host, &inbound_scheme, client, egress);
        set_header(&mut parts.headers, HOST, &self.authority);

        parts.uri = target.uri;
        parts.extensions.insert(target.routing.clone());
        Ok(target.routing)
    }
}

/// Apply the `X-Forwarded-*` and `Forwarded` headers.
pub fn set_forwarding_headers(
    headers: &mut HeaderMap,
    host: &str,
    scheme: &str,
    client: Option<IpAddr>,
    egress: IpAddr,
) {
    let mut forwarded_for = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ");
    if forwarded_for.is_empty() {
        if let Some(ip) = client {
            forwarded_for = ip.to_string();
        }
    }

    headers.remove(&X_FORWARDED_PORT);
    if !forwarded_for.is_empty() {
        set_header(headers, X_FORWARDED_FOR, &forwarded_for);
    }
    set_header(headers, X_FORWARDED_HOST, host);
    set_header(headers, X_FORWARDED_PROTO, scheme);
    if let Some(port) = Authority::from_str(host).ok().and_then(|a| a.port_u16()) {
        set_header(headers, X_FORWARDED_PORT, &port.to_string());
    }

    let forwarded = format!("by={};for={};host={};proto={}", egress, forwarded_for, host, scheme);
    set_header(headers, FORWARDED, &forwarded);
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => {
            tracing::debug!(header = %name, "Skipping header with invalid value");
        }
    }
}

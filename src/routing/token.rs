//! Routing-token decoding.
//!
//! A routed path has the shape
//!
//! ```text
//! <page-path> [ <separator> <app-alias> [ "/" <app-path...> ] ]
//! ```
//!
//! Decoding is total: a path without the separator simply has no token.

/// Per-request routing decision, attached to the outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingContext {
    /// Page portion of the path.
    pub proxied_path: String,
    /// Alias of the addressed app; empty when no token was present.
    pub app_alias: String,
    /// Sub-path for the app's own router; empty or starting with `/`.
    pub app_path: String,
}

impl RoutingContext {
    /// Whether the inbound path carried a routing token.
    pub fn has_app(&self) -> bool {
        !self.app_alias.is_empty()
    }
}

/// Decoded form of one path representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decoded<'a> {
    pub page: std::borrow::Cow<'a, str>,
    pub token: Option<(&'a str, Option<&'a str>)>,
}

/// Split `path` at the first `separator`.
///
/// Returns the page path (with a trailing slash added when `append_slash`
/// is set and a token is present) and, when present, the `(alias, rest)`
/// pair where `rest` excludes the leading `/` and is `None` when the
/// segment after the separator has no `/` at all.
pub(crate) fn split_token<'a>(path: &'a str, separator: &str, append_slash: bool) -> Decoded<'a> {
    let Some(idx) = path.find(separator).filter(|_| !separator.is_empty()) else {
        return Decoded { page: path.into(), token: None };
    };

    let left = &path[..idx];
    let right = &path[idx + separator.len()..];

    let page = if append_slash && !left.ends_with('/') {
        format!("{}/", left).into()
    } else {
        left.into()
    };

    let token = match right.split_once('/') {
        Some((alias, rest)) => (alias, Some(rest)),
        None => (right, None),
    };

    Decoded { page, token: Some(token) }
}

/// Decode the routing context carried by `path`.
pub fn decode(path: &str, separator: &str, append_slash: bool) -> RoutingContext {
    let decoded = split_token(path, separator, append_slash);
    match decoded.token {
        None => RoutingContext {
            proxied_path: path.to_string(),
            app_alias: String::new(),
            app_path: String::new(),
        },
        Some((alias, rest)) => RoutingContext {
            proxied_path: decoded.page.into_owned(),
            app_alias: alias.to_string(),
            app_path: rest.map(|rest| format!("/{}", rest)).unwrap_or_default(),
        },
    }
}

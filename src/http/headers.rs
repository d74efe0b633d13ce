//! Header names owned by the gateway.

use axum::http::{header, HeaderMap, HeaderName};

/// Routed app alias, stamped on the upstream request.
pub const X_KDEX_PROXY_APP_ALIAS: HeaderName = HeaderName::from_static("x-kdex-proxy-app-alias");

/// Routed app sub-path, stamped on the upstream request.
pub const X_KDEX_PROXY_APP_PATH: HeaderName = HeaderName::from_static("x-kdex-proxy-app-path");

/// Connection-scoped headers never forwarded in either direction.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

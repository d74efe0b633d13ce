//! KDex gateway library.
//!
//! A reverse proxy in front of one upstream origin that composes remote
//! micro-frontend applications into the HTML pages the origin serves.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server ──▶ routing::rewriter ──▶ upstream
//!                         │  (session, egress IP,   (routing token,
//!                         │   routing headers)       template paths,
//!                         │                          forwarding headers)
//!                         ▼
//!     Client Response  http::response ◀── upstream response
//!     ◀───────────────   (buffer → dom::parse → transform chain
//!                         → dom::serialize → Content-Length)
//! ```

// Core subsystems
pub mod config;
pub mod dom;
pub mod http;
pub mod net;
pub mod routing;
pub mod transform;

// Boundaries and cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod session;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

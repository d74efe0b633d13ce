//! HTTP front controller subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (request ID)
//!     → session resolution + routing::PathRewriter (upstream target, forwarding headers)
//!     → headers.rs (routing headers, hop-by-hop stripping)
//!     → upstream round trip (hyper-util client)
//!     → response.rs (buffer + transform eligible HTML)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::TransformationDriver;
pub use server::{HttpServer, ServerError};

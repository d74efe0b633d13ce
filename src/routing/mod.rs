//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, host)
//!     → token.rs (split page path / app alias / app path)
//!     → matcher.rs (template-path aliasing)
//!     → path.rs (join with upstream prefix, merge queries)
//!     → rewriter.rs (outbound URI + forwarding headers + RoutingContext)
//! ```
//!
//! # Design Decisions
//! - Single upstream origin; no route table
//! - Deterministic: same input always produces the same target
//! - Routing-token decode is total; bad tokens mean "no token"
//! - First template match wins (configuration order)

pub mod matcher;
pub mod path;
pub mod rewriter;
pub mod token;

pub use rewriter::{PathRewriter, RewriteError, UpstreamTarget};
pub use token::RoutingContext;

//! Network helpers.
//!
//! # Data Flow
//! ```text
//! Per request:
//!     → egress.rs (route probe over a throwaway UDP socket)
//!     → IP used in the `Forwarded` header's `by=` element
//! ```

pub mod egress;

pub use egress::egress_ip;

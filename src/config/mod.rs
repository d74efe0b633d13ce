//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, assign missing app aliases)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppDescriptor, AppTarget, FieldQuery, ImportMapConfig, ListenerConfig, MetaConfig,
    NavigationConfig, ObservabilityConfig, ProxyConfig, TemplatePath, TransformConfig,
    TransformerKind, UpstreamConfig,
};

//! Document tree subsystem.
//!
//! # Data Flow
//! ```text
//! upstream HTML bytes
//!     → parse.rs (html5ever tree builder → arena Document)
//!     → transformers mutate the Document via tree.rs
//!         (query.rs / select.rs locate nodes, read-only)
//!     → serialize.rs (Document → HTML bytes)
//! ```
//!
//! # Design Decisions
//! - Arena ownership: nodes link by `NodeId`, the `Document` owns them all
//! - One document per response, never shared between tasks
//! - Search helpers never mutate and return `None` rather than erroring

pub mod parse;
pub mod query;
pub mod select;
pub mod serialize;
pub mod tree;

pub use parse::{parse_document, parse_fragment};
pub use query::{collect_text, find_element_by_id, find_element_by_name, find_element_by_name_where};
pub use select::{Selector, SelectorError};
pub use serialize::serialize_document;
pub use tree::{Document, ElementData, NodeData, NodeId};

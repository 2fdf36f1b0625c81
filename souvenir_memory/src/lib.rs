#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub mod backend;
mod context;
mod error;
pub mod extractor;
pub mod patterns;
pub mod record;
pub mod scope;
mod service;
mod store;

pub use backend::{JsonFileBackend, MemoryBackend, SqlMemoryBackend};
pub use context::format_context;
pub use error::{MemoryError, Result};
pub use extractor::{Extraction, Extractor, default_extractor};
pub use patterns::{BuildError, PatternLibrary, PatternRule, default_library};
pub use record::{Category, Fact, FactMap, MemoryRecord};
pub use scope::{GLOBAL_RECORD_KEY, GlobalMemory, PerConversation, ScopeResolver, resolver_for};
pub use service::MemoryService;
pub use store::MemoryStore;

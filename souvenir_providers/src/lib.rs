#![deny(
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

mod clean;
mod http;
mod pdf;
mod queue;
mod retry;

pub use clean::clean_response;
pub use http::HttpGenerator;
pub use pdf::{PdfExtractor, TRUNCATION_MARKER, truncate_with_marker};
pub use queue::GenerationQueue;
pub use retry::RetryPolicy;

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

//! Chat turns over a persistent transcript.
//!
//! # Key Features
//! - Prompt assembly with a bounded history window
//! - Relational conversation store
//! - The request pipeline tying memory, generation and storage together

mod error;
mod history;
mod pipeline;
mod prompt;
mod store;

pub use error::ConversationError;
pub use history::{HistoryConfig, HistoryWindow};
pub use pipeline::{ChatInput, ChatPipeline, ChatReply, Sampling, title_from_message};
pub use prompt::{ASSISTANT_CUE, PromptAssembler, assemble_prompt};
pub use store::SqlConversationStore;

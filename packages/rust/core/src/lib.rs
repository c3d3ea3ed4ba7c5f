//! Core pipeline orchestration and domain logic for TopicPress.
//!
//! This crate ties intent classification, web research, and model calls into
//! the topic pipeline, and wires it to storage in [`BlogService`].

pub mod boundary;
pub mod intent;
pub mod pipeline;
pub mod prompts;
pub mod service;

#[cfg(test)]
mod testing;

pub use intent::{canned_reply, classify};
pub use pipeline::{PipelineProgress, SilentProgress, Stage, TopicPipeline, word_count};
pub use service::{BlogService, GenerateBlogOutcome};

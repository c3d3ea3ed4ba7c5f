//! Language-model access for TopicPress.
//!
//! - [`GenerationProvider`]: the generation seam, implemented by [`GeminiClient`]
//! - [`ModelInvoker`]: primary-then-fallback model chain with per-attempt timeouts
//! - [`sanitize_request`]: strips unsupported parameters from outbound bodies

pub mod gemini;
pub mod invoker;
pub mod provider;
pub mod sanitize;

pub use gemini::{GeminiClient, GeminiSettings};
pub use invoker::{ModelChain, ModelInvoker};
pub use provider::GenerationProvider;
pub use sanitize::sanitize_request;

//! Error boundary around a pipeline run.
//!
//! Whatever happens inside, the caller gets a [`GenerationResult`] with a
//! non-empty body.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use topicpress_shared::GenerationResult;

/// Drive `run` to completion, converting a panic or an empty body into a
/// `System Error` result.
pub async fn contain<F>(run: F) -> GenerationResult
where
    F: Future<Output = GenerationResult>,
{
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(result) if result.blog_content.trim().is_empty() => {
            error!(intent = ?result.intent, "pipeline produced an empty body");
            GenerationResult::system_error("the pipeline produced an empty response")
        }
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%message, "pipeline panicked");
            GenerationResult::system_error(message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

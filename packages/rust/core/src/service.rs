//! Blog generation with persistence: one chat per request, the pipeline in
//! the middle, the article saved at the end.

use serde::Serialize;
use tracing::{info, instrument};

use topicpress_shared::{MessageRole, Result};
use topicpress_storage::Storage;

use crate::pipeline::{PipelineProgress, TopicPipeline};

/// What `generate_blog` hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateBlogOutcome {
    pub chat_id: String,
    pub blog_id: String,
    pub topic: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_summary: Option<String>,
    pub search_results_count: usize,
}

/// Text stored as the user's side of the conversation.
pub fn request_message(topic: &str) -> String {
    format!("Generate a blog about: {topic}")
}

pub struct BlogService {
    pipeline: TopicPipeline,
    storage: Storage,
}

impl BlogService {
    pub fn new(pipeline: TopicPipeline, storage: Storage) -> Self {
        Self { pipeline, storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Generate and persist a blog for `username`.
    ///
    /// The pipeline never fails; storage errors are returned as-is.
    #[instrument(skip_all, fields(user = %username, topic = %topic))]
    pub async fn generate_blog(
        &self,
        username: &str,
        topic: &str,
        progress: &dyn PipelineProgress,
    ) -> Result<GenerateBlogOutcome> {
        let user = self.storage.get_or_create_user(username).await?;
        let chat = self.storage.create_chat(&user.id, topic).await?;
        self.storage
            .add_message(&chat.id, MessageRole::User, &request_message(topic))
            .await?;

        let result = self.pipeline.process_topic(topic, progress).await;

        let blog = self
            .storage
            .insert_blog(&user.id, Some(&chat.id), topic, &result.blog_content)
            .await?;
        self.storage
            .add_message(&chat.id, MessageRole::Assistant, &result.blog_content)
            .await?;

        info!(chat_id = %chat.id, blog_id = %blog.id, "blog saved");

        Ok(GenerateBlogOutcome {
            chat_id: chat.id,
            blog_id: blog.id,
            topic: topic.to_string(),
            content: result.blog_content,
            research_summary: result.research_summary,
            search_results_count: result.search_results_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use topicpress_shared::PipelineOptions;
    use uuid::Uuid;

    use crate::intent::IDENTITY_REPLY;
    use crate::pipeline::SilentProgress;
    use crate::testing::{FakeModels, FakeSearch, pipeline};

    async fn service(search: &Arc<FakeSearch>, models: &Arc<FakeModels>) -> BlogService {
        let tmp = std::env::temp_dir().join(format!("tp_service_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.expect("open test db");
        BlogService::new(pipeline(search, models, PipelineOptions::default()), storage)
    }

    #[tokio::test]
    async fn generate_blog_persists_chat_messages_and_blog() {
        let search = FakeSearch::with_hits(3);
        let models = FakeModels::ok();
        let svc = service(&search, &models).await;

        let outcome = svc
            .generate_blog("alice", "Benefits of AI", &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome.content, "polished article");
        assert_eq!(outcome.research_summary.as_deref(), Some("summary of sources"));
        assert_eq!(outcome.search_results_count, 9);

        let storage = svc.storage();
        let messages = storage.get_chat_messages(&outcome.chat_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Generate a blog about: Benefits of AI");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "polished article");

        let blog = storage.get_blog(&outcome.blog_id).await.unwrap().unwrap();
        assert_eq!(blog.topic, "Benefits of AI");
        assert_eq!(blog.chat_id.as_deref(), Some(outcome.chat_id.as_str()));

        let user = storage.find_user("alice").await.unwrap().unwrap();
        let chats = storage.list_chats(&user.id).await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title, "Benefits of AI");
    }

    #[tokio::test]
    async fn canned_replies_are_saved_too() {
        let search = FakeSearch::with_hits(3);
        let models = FakeModels::ok();
        let svc = service(&search, &models).await;

        let outcome = svc
            .generate_blog("alice", "who are you", &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome.content, IDENTITY_REPLY);
        assert!(outcome.research_summary.is_none());
        assert_eq!(outcome.search_results_count, 0);
        assert!(svc.storage().get_blog(&outcome.blog_id).await.unwrap().is_some());
    }
}

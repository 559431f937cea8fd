//! Model-call seams: the chat completion and embedding interfaces.
//!
//! The expansion driver and synthesis passes talk to these traits rather
//! than a concrete HTTP client, so tests can script responses without
//! network access. The [`PipelineContext`] bundles one instance of each
//! and is constructed once per run, then passed down explicitly.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Chat completion interface; one blocking call per prompt.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Request one completion for `prompt`. Implementations must return
    /// non-empty text; an empty completion is a fatal contract violation.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// Text embedding interface; one fixed-length vector per input text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
impl ChatClient for openai::OpenAi {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        Ok(self.complete_text(prompt, temperature).await?)
    }
}

#[async_trait]
impl Embedder for openai::OpenAi {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = openai::OpenAi::embed(self, texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::EmbeddingCount {
                sent: texts.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

/// Everything a pipeline pass needs to call models.
#[derive(Clone)]
pub struct PipelineContext {
    chat: Arc<dyn ChatClient>,
    embedder: Arc<dyn Embedder>,
}

impl PipelineContext {
    /// Bundle a chat client and an embedder.
    pub fn new(chat: Arc<dyn ChatClient>, embedder: Arc<dyn Embedder>) -> Self {
        Self { chat, embedder }
    }

    /// Build both interfaces from the `OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let client = openai::OpenAi::from_env().map_err(Error::Api)?;
        let chat: Arc<dyn ChatClient> = Arc::new(client.clone());
        let embedder: Arc<dyn Embedder> = Arc::new(client);
        Ok(Self { chat, embedder })
    }

    pub fn chat(&self) -> &dyn ChatClient {
        self.chat.as_ref()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }
}

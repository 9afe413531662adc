pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::base::types::Res;

// Types.

/// A request to the LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmRequest {
    pub prompt: String,
    /// Language code the answer should be written in (e.g. `en`).
    pub language: String,
}

/// A successful LLM backend answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmResponse {
    pub generated_text: String,
}

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// Implementations must report a missing credential as
/// [`AssistantError::Configuration`](crate::base::types::AssistantError::Configuration)
/// and every other backend failure as
/// [`AssistantError::Transport`](crate::base::types::AssistantError::Transport).
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Generate health guidance for a worker's question.
    async fn generate(&self, request: &LlmRequest) -> Res<LlmResponse>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}

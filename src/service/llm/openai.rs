//! OpenAI-compatible chat completions backend.
//!
//! The health assistant gateway speaks the OpenAI chat completions protocol,
//! so this client is a thin wrapper around `async-openai` pointed at the
//! configured API base. Each attempt is bounded by a timeout and failed
//! attempts are retried with exponential backoff.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::base::{
    config::Config,
    prompts,
    types::{AssistantError, Res},
};

use super::{GenericLlmClient, LlmClient, LlmRequest, LlmResponse};

const RETRY_DELAY_MS: u64 = 500;

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI-compatible LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI-compatible LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_base(config.llm_api_base.clone()).with_api_key(config.llm_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    /// Build the chat completion request for a worker's question.
    fn build_request(&self, request: &LlmRequest) -> Res<CreateChatCompletionRequest> {
        let directive = format!("{}\n{}", self.config.llm_system_directive.trim(), prompts::language_directive(&request.language));

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default().content(directive).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default().content(request.prompt.clone()).build()?.into(),
        ];

        Ok(CreateChatCompletionRequestArgs::default().model(&self.config.llm_model).messages(messages).build()?)
    }

    /// Make the API call with retry logic and timeout handling.
    ///
    /// Every failure that survives the retries is a transport failure.
    async fn call_llm_api(&self, request: CreateChatCompletionRequest) -> Res<CreateChatCompletionResponse> {
        let max_retries = self.config.llm_max_retries;
        let attempt_timeout = Duration::from_secs(self.config.llm_timeout_secs);

        let mut retries = 0;

        loop {
            let result = timeout(attempt_timeout, self.client.chat().create(request.clone())).await;

            let failure = match result {
                Ok(Ok(response)) => {
                    info!("LLM API call succeeded after {} attempts", retries + 1);
                    return Ok(response);
                }
                Ok(Err(err)) => format!("LLM backend error: {err}"),
                Err(_) => format!("LLM backend timed out after {}s", attempt_timeout.as_secs()),
            };

            if retries >= max_retries {
                return Err(AssistantError::transport(format!("{failure} (after {} attempts)", retries + 1)));
            }

            retries += 1;
            warn!("{failure}, retrying {retries}/{max_retries}");

            let delay = Duration::from_millis(RETRY_DELAY_MS * 2_u64.pow(retries - 1));
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::generate", skip_all)]
    async fn generate(&self, request: &LlmRequest) -> Res<LlmResponse> {
        // A missing credential fails before any network call.
        if self.config.llm_api_key.trim().is_empty() {
            return Err(AssistantError::configuration("LLM API key is not configured."));
        }

        let chat_request = self.build_request(request)?;
        let response = self.call_llm_api(chat_request).await?;

        let generated_text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AssistantError::transport("LLM backend returned an empty response."))?;

        Ok(LlmResponse { generated_text })
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::config::ConfigInner;

    fn create_test_config(api_key: &str) -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                llm_api_key: api_key.to_string(),
                // Nothing listens on the discard port, so connections are refused immediately.
                llm_api_base: "http://127.0.0.1:9/v1".to_string(),
                llm_timeout_secs: 2,
                llm_max_retries: 0,
                ..Default::default()
            }),
        }
    }

    fn create_test_request() -> LlmRequest {
        LlmRequest {
            prompt: "What are danger signs in pregnancy?".to_string(),
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = LlmClient::openai(&create_test_config("  "));

        let err = client.generate(&create_test_request()).await.unwrap_err();

        assert!(matches!(AssistantError::classify(&err), AssistantError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let client = LlmClient::openai(&create_test_config("sk-test"));

        let err = client.generate(&create_test_request()).await.unwrap_err();

        assert!(matches!(AssistantError::classify(&err), AssistantError::Transport(_)));
    }

    #[tokio::test]
    async fn test_silent_backend_times_out_and_retries() {
        // Accept connections and never answer.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = Config {
            inner: Arc::new(ConfigInner {
                llm_api_key: "sk-test".to_string(),
                llm_api_base: format!("http://{address}/v1"),
                llm_timeout_secs: 1,
                llm_max_retries: 1,
                ..Default::default()
            }),
        };
        let client = LlmClient::openai(&config);

        let err = client.generate(&create_test_request()).await.unwrap_err();

        let AssistantError::Transport(message) = AssistantError::classify(&err) else {
            panic!("expected a transport failure, got {err:#}");
        };
        assert!(message.contains("timed out"), "{message}");
        assert!(message.contains("after 2 attempts"), "{message}");

        server.abort();
    }

    #[test]
    fn test_build_request_includes_language_directive() {
        let client = OpenAiLlmClient::new(&create_test_config("sk-test"));
        let request = LlmRequest {
            prompt: "Fever in a 2 year old".to_string(),
            language: "hi".to_string(),
        };

        let chat_request = client.build_request(&request).unwrap();
        let json = serde_json::to_value(&chat_request).unwrap();

        assert_eq!(json["model"], "google/gemini-2.5-flash");
        assert!(json["messages"][0]["content"].as_str().unwrap().ends_with("Respond in the local language requested."));
        assert_eq!(json["messages"][1]["content"], "Fever in a 2 year old");
    }
}

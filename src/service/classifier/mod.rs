//! The "classifier" capability: turn a worker's question into guidance plus a risk flag.
//!
//! Two implementations exist. The static one answers from the built-in rule
//! table and flags risk from the question. The LLM one answers from the
//! configured backend and flags risk from the generated text. Configuration
//! selects which one a session uses.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    base::{
        config::{ClassifierBackend, Config},
        types::Res,
    },
    service::llm::{LlmClient, LlmRequest},
    triage::{self, risk::RiskSource},
};

// Types.

/// A classified answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub response_text: String,
    pub is_high_risk: bool,
    /// Which text the risk flag was computed from.
    pub risk_source: RiskSource,
}

// Traits.

/// Generic classifier trait that backends must implement.
#[async_trait]
pub trait GenericClassifier: Send + Sync + 'static {
    /// Classify a non-empty question.
    async fn classify(&self, input: &str) -> Res<Classification>;
}

// Structs.

/// Classifier for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ClassifierClient {
    inner: Arc<dyn GenericClassifier>,
}

impl Deref for ClassifierClient {
    type Target = dyn GenericClassifier;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ClassifierClient {
    pub fn new(inner: Arc<dyn GenericClassifier>) -> Self {
        Self { inner }
    }

    /// The rule-table classifier.
    pub fn rule_table() -> Self {
        Self::new(Arc::new(StaticClassifier))
    }

    /// The LLM-backed classifier.
    pub fn llm(llm: LlmClient, language: impl Into<String>) -> Self {
        Self::new(Arc::new(LlmClassifier {
            llm,
            language: language.into(),
        }))
    }

    /// Select the classifier named by the configuration.
    pub fn from_config(config: &Config) -> Self {
        match config.classifier_backend {
            ClassifierBackend::Static => Self::rule_table(),
            ClassifierBackend::Llm => Self::llm(LlmClient::openai(config), config.llm_language.clone()),
        }
    }
}

// Specific implementations.

/// Answers from the built-in protocol rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticClassifier;

#[async_trait]
impl GenericClassifier for StaticClassifier {
    #[instrument(name = "StaticClassifier::classify", skip_all)]
    async fn classify(&self, input: &str) -> Res<Classification> {
        let triage = triage::classify(input);

        debug!("Matched topic {:?} (high risk: {})", triage.topic, triage.is_high_risk);

        Ok(Classification {
            response_text: triage.response_text,
            is_high_risk: triage.is_high_risk,
            risk_source: RiskSource::Input,
        })
    }
}

/// Answers from the LLM backend.
#[derive(Clone)]
pub struct LlmClassifier {
    llm: LlmClient,
    language: String,
}

#[async_trait]
impl GenericClassifier for LlmClassifier {
    #[instrument(name = "LlmClassifier::classify", skip_all)]
    async fn classify(&self, input: &str) -> Res<Classification> {
        let request = LlmRequest {
            prompt: input.to_string(),
            language: self.language.clone(),
        };

        // Backend failures propagate; they are never replaced by canned guidance.
        let response = self.llm.generate(&request).await?;
        let is_high_risk = triage::risk::response_is_high_risk(&response.generated_text);

        debug!("LLM answered (high risk: {})", is_high_risk);

        Ok(Classification {
            response_text: response.generated_text,
            is_high_risk,
            risk_source: RiskSource::Response,
        })
    }
}

// Tests.

//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Which backend answers assistant questions.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// The built-in protocol rule table.
    #[default]
    Static,
    /// An OpenAI-compatible LLM gateway.
    Llm,
}

/// Default LLM gateway base URL.
fn default_llm_api_base() -> String {
    "https://ai.gateway.lovable.dev/v1".to_string()
}

/// Default LLM model to use.
fn default_llm_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

/// Default response language code.
fn default_llm_language() -> String {
    "en".to_string()
}

/// Default system directive for the health assistant.
fn default_llm_system_directive() -> String {
    prompts::HEALTH_ASSISTANT_SYSTEM_DIRECTIVE.to_string()
}

/// Default per-attempt timeout for LLM calls, in seconds.
fn default_llm_timeout_secs() -> u64 {
    30
}

/// Default number of LLM retries after the first attempt.
fn default_llm_max_retries() -> u32 {
    2
}

/// Default database endpoint (embedded, in-memory).
fn default_db_endpoint() -> String {
    "mem://".to_string()
}

fn default_db_namespace() -> String {
    "chw".to_string()
}

fn default_db_database() -> String {
    "cases".to_string()
}

/// Configuration for the chw-assistant application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Which backend answers assistant questions (`CLASSIFIER_BACKEND`): `static` or `llm`.
    #[serde(default)]
    pub classifier_backend: ClassifierBackend,
    /// LLM gateway API key (`LLM_API_KEY`).
    ///
    /// Left empty, the LLM backend reports itself as not configured on each request.
    #[serde(default)]
    pub llm_api_key: String,
    /// LLM gateway base URL (`LLM_API_BASE`).
    #[serde(default = "default_llm_api_base")]
    pub llm_api_base: String,
    /// LLM model to use (`LLM_MODEL`).
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Language code the assistant should answer in (`LLM_LANGUAGE`).
    #[serde(default = "default_llm_language")]
    pub llm_language: String,
    /// Optional custom system directive to override the default (`LLM_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_llm_system_directive")]
    pub llm_system_directive: String,
    /// Per-attempt timeout for LLM calls, in seconds (`LLM_TIMEOUT_SECS`).
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    /// Retries after the first failed LLM attempt (`LLM_MAX_RETRIES`).
    #[serde(default = "default_llm_max_retries")]
    pub llm_max_retries: u32,
    /// Database endpoint URL (`DB_ENDPOINT`), e.g. `mem://` or `ws://localhost:8000`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`); sign-in is skipped when empty.
    #[serde(default)]
    pub db_username: String,
    /// Database password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: String,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Worker identity to sign in as at startup (`WORKER_ID`).
    #[serde(default)]
    pub worker_id: Option<String>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            classifier_backend: ClassifierBackend::default(),
            llm_api_key: String::new(),
            llm_api_base: default_llm_api_base(),
            llm_model: default_llm_model(),
            llm_language: default_llm_language(),
            llm_system_directive: default_llm_system_directive(),
            llm_timeout_secs: default_llm_timeout_secs(),
            llm_max_retries: default_llm_max_retries(),
            db_endpoint: default_db_endpoint(),
            db_username: String::new(),
            db_password: String::new(),
            db_namespace: default_db_namespace(),
            db_database: default_db_database(),
            worker_id: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inner: Arc::new(ConfigInner::default()),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("CHW_ASSISTANT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if self.llm_timeout_secs < 1 || self.llm_timeout_secs > 600 {
            return Err(anyhow::anyhow!("LLM timeout must be between 1 and 600 seconds."));
        }

        if self.llm_max_retries > 10 {
            return Err(anyhow::anyhow!("LLM max retries must be at most 10."));
        }

        if self.llm_api_base.trim().is_empty() {
            return Err(anyhow::anyhow!("LLM API base must not be empty."));
        }

        Ok(())
    }
}

// Tests.

//! Library root for `chw-assistant`.
//!
//! Chw-assistant is a field companion for community health workers designed to:
//! - Answer maternal and child health questions with protocol guidance
//! - Flag high-risk situations that need immediate referral
//! - Keep a per-worker log of patient cases with follow-up tracking
//! - Notify the worker live when their cases change
//!
//! Guidance comes from a fixed rule table or an OpenAI-compatible LLM
//! gateway, and cases live in SurrealDB. The architecture is built around
//! extensible traits that allow for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;
pub mod triage;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::{info, warn};

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the chw-assistant runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the case store, auth, and classifier
/// - Answers `ask` once, or runs the console session
pub async fn start(config: Config, ask: Option<&str>) -> Void {
    info!("Starting chw-assistant ...");

    // Start the crypto provider.
    if crypto::ring::default_provider().install_default().is_err() {
        warn!("A crypto provider was already installed.");
    }

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start(ask).await?;

    Ok(())
}

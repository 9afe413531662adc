//! Service integrations for external collaborators.
//!
//! This module contains the services used by the chw-assistant:
//! - Classification of questions (rule table or LLM)
//! - LLM services (an OpenAI-compatible gateway)
//! - Case storage (e.g., SurrealDB)
//! - Authentication, notifications, and audio capture
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod audio;
pub mod auth;
pub mod classifier;
pub mod db;
pub mod llm;
pub mod notify;

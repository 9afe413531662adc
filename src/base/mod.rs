//! Core components, types, and utilities for the chw-assistant.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Prompts for LLM interactions and the assistant greeting.
//! - Common types, the error taxonomy, and result handling.

pub mod config;
pub mod prompts;
pub mod types;

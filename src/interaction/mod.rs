//! Worker-facing interactions for chw-assistant.
//!
//! This module coordinates the services into what a health worker does:
//! - Asking the assistant by text, voice, or image
//! - Recording new cases and browsing case history
//! - Receiving live notices when their cases change
//! - Driving all of it from a line-oriented console

pub mod assistant;
pub mod case_entry;
pub mod case_events;
pub mod case_history;
pub mod console;

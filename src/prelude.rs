pub use crate::base::{
    config::Config,
    types::{AssistantError, Err, Notice, Res, Session, Turn, Void},
};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};

//! User-visible notifications.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::base::types::{Notice, NoticeVariant, Void};

// Traits.

/// Generic notification sink that front-ends must implement.
#[async_trait]
pub trait GenericNotifier: Send + Sync + 'static {
    /// Show a notice to the worker.
    async fn notify(&self, notice: &Notice) -> Void;
}

// Structs.

/// Notifier for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct NotifierClient {
    inner: Arc<dyn GenericNotifier>,
}

impl Deref for NotifierClient {
    type Target = dyn GenericNotifier;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl NotifierClient {
    pub fn new(inner: Arc<dyn GenericNotifier>) -> Self {
        Self { inner }
    }

    /// A notifier that writes notices to the log.
    pub fn log() -> Self {
        Self::new(Arc::new(LogNotifier))
    }
}

// Specific implementations.

/// Writes notices to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl GenericNotifier for LogNotifier {
    async fn notify(&self, notice: &Notice) -> Void {
        match notice.variant {
            NoticeVariant::Default => info!("{}: {}", notice.title, notice.description),
            NoticeVariant::Destructive => warn!("{}: {}", notice.title, notice.description),
        }

        Ok(())
    }
}

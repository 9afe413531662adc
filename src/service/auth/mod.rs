//! Authentication provider integration.
//!
//! The provider issues a [`Session`] carrying a stable worker identity and
//! broadcasts session changes (login/logout) that the rest of the application
//! reacts to.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::base::types::{AssistantError, Res, Session, Void};

// Traits.

/// Generic authentication trait that providers must implement.
#[async_trait]
pub trait GenericAuthClient: Send + Sync + 'static {
    /// The current session, if a worker is signed in.
    fn current_session(&self) -> Option<Session>;

    /// A receiver that observes every session change.
    ///
    /// `Some` means a worker signed in; `None` means the session ended.
    fn session_events(&self) -> watch::Receiver<Option<Session>>;

    /// Sign a worker in.
    async fn sign_in(&self, worker_id: &str) -> Res<Session>;

    /// End the current session.
    async fn sign_out(&self) -> Void;
}

// Structs.

/// Authentication client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<dyn GenericAuthClient>,
}

impl Deref for AuthClient {
    type Target = dyn GenericAuthClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl AuthClient {
    pub fn new(inner: Arc<dyn GenericAuthClient>) -> Self {
        Self { inner }
    }

    /// A provider that trusts the worker identity it is given.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalAuthClient::new()))
    }
}

// Specific implementations.

/// Local authentication: any non-empty worker identity may sign in.
pub struct LocalAuthClient {
    sender: watch::Sender<Option<Session>>,
}

impl LocalAuthClient {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }
}

impl Default for LocalAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenericAuthClient for LocalAuthClient {
    fn current_session(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    fn session_events(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }

    #[instrument(name = "LocalAuthClient::sign_in", skip(self))]
    async fn sign_in(&self, worker_id: &str) -> Res<Session> {
        let worker_id = worker_id.trim();

        if worker_id.is_empty() {
            return Err(AssistantError::validation("A worker identity is required to sign in."));
        }

        let session = Session {
            worker_id: worker_id.to_string(),
            email: None,
        };

        self.sender.send_replace(Some(session.clone()));
        info!("Worker `{}` signed in.", worker_id);

        Ok(session)
    }

    #[instrument(name = "LocalAuthClient::sign_out", skip(self))]
    async fn sign_out(&self) -> Void {
        if let Some(session) = self.sender.send_replace(None) {
            info!("Worker `{}` signed out.", session.worker_id);
        }

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out_broadcasts() {
        let auth = AuthClient::local();
        let mut events = auth.session_events();

        assert!(auth.current_session().is_none());

        let session = auth.sign_in("chw-42").await.unwrap();
        events.changed().await.unwrap();
        assert_eq!(events.borrow_and_update().as_ref(), Some(&session));
        assert_eq!(auth.current_session(), Some(session));

        auth.sign_out().await.unwrap();
        events.changed().await.unwrap();
        assert!(events.borrow_and_update().is_none());
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_rejects_empty_identity() {
        let auth = AuthClient::local();

        let err = auth.sign_in("   ").await.unwrap_err();

        assert!(matches!(AssistantError::classify(&err), AssistantError::Validation(_)));
        assert!(auth.current_session().is_none());
    }
}

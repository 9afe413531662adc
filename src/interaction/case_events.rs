//! Live case notifications for the signed-in worker.
//!
//! The manager follows the session: a login opens a subscription to that
//! worker's cases, and a logout (or a different worker signing in) closes it.
//! At most one subscription is open at a time.

use futures::StreamExt;
use tokio::{sync::watch, task::JoinHandle};
use tracing::Instrument;

use crate::{
    base::types::{CaseChange, CaseChangeKind},
    prelude::*,
    service::{db::DbClient, notify::NotifierClient},
};

/// The notice shown for a case change, if any.
pub fn notice_for(change: &CaseChange) -> Option<Notice> {
    match change.kind {
        CaseChangeKind::Insert => Some(Notice::info("New Case Added", "A new patient case has been recorded.")),
        CaseChangeKind::Update => Some(Notice::info("Case Updated", "A patient case has been updated.")),
        CaseChangeKind::Delete => None,
    }
}

/// An open subscription.
///
/// Closing (or dropping) the handle stops the forwarding task, which drops
/// the live stream and ends the subscription at the store.
pub struct SubscriptionHandle {
    worker_id: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Subscribe to `worker_id`'s cases and forward changes to the notifier.
    #[instrument(skip(db, notifier))]
    pub async fn open(db: &DbClient, notifier: NotifierClient, worker_id: &str) -> Res<Self> {
        let mut changes = db.watch_cases(worker_id).await?;

        let task = tokio::spawn(
            async move {
                while let Some(change) = changes.next().await {
                    let change = match change {
                        Ok(change) => change,
                        Err(err) => {
                            error!("Case subscription error: {err:#}");
                            continue;
                        }
                    };

                    debug!("Case `{}` changed ({:?}).", change.case.id, change.kind);

                    let Some(notice) = notice_for(&change) else {
                        continue;
                    };

                    if let Err(err) = notifier.notify(&notice).await {
                        warn!("Could not show case notice: {err:#}");
                    }
                }

                info!("Case subscription stream ended.");
            }
            .in_current_span(),
        );

        info!("Subscribed to cases for worker `{}`.", worker_id);

        Ok(Self {
            worker_id: worker_id.to_string(),
            task,
        })
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Stop receiving changes.
    pub fn close(self) {
        self.task.abort();
        info!("Closed case subscription for worker `{}`.", self.worker_id);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Keeps the case subscription in step with the session.
pub struct CaseSubscriptionManager {
    db: DbClient,
    notifier: NotifierClient,
    current: Option<SubscriptionHandle>,
}

impl CaseSubscriptionManager {
    pub fn new(db: DbClient, notifier: NotifierClient) -> Self {
        Self { db, notifier, current: None }
    }

    /// The worker whose cases are being watched.
    pub fn subscribed_worker(&self) -> Option<&str> {
        self.current.as_ref().map(SubscriptionHandle::worker_id)
    }

    /// React to one session value.
    pub async fn apply(&mut self, session: Option<&Session>) -> Void {
        let worker_id = session.map(|session| session.worker_id.as_str());

        if worker_id.is_some() && worker_id == self.subscribed_worker() {
            return Ok(());
        }

        self.close();

        if let Some(worker_id) = worker_id {
            self.current = Some(SubscriptionHandle::open(&self.db, self.notifier.clone(), worker_id).await?);
        }

        Ok(())
    }

    /// Close the open subscription, if any.
    pub fn close(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.close();
        }
    }

    /// Follow session changes until the session sender goes away.
    #[instrument(name = "CaseSubscriptionManager::run", skip_all)]
    pub async fn run(mut self, mut sessions: watch::Receiver<Option<Session>>) {
        loop {
            let session = sessions.borrow_and_update().clone();

            if let Err(err) = self.apply(session.as_ref()).await {
                error!("Could not follow session change: {err:#}");
            }

            if sessions.changed().await.is_err() {
                break;
            }
        }

        self.close();
    }

    /// Run the manager on its own task.
    pub fn spawn(self, sessions: watch::Receiver<Option<Session>>) -> JoinHandle<()> {
        tokio::spawn(self.run(sessions).in_current_span())
    }
}

// Tests.

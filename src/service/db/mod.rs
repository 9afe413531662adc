use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::base::types::{CaseChange, CaseUpdate, NewCase, PatientCase, Res, Void};

pub mod surreal;

// Types.

/// Live stream of case changes for one worker.
///
/// Dropping the stream ends the underlying subscription.
pub type CaseChangeStream = BoxStream<'static, Res<CaseChange>>;

// Traits.

/// Generic case store trait that clients must implement.
///
/// This trait defines the core functionality for recording and retrieving
/// patient cases. Every failure is reported as a transport failure, since the
/// store is an external collaborator.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Records a new case owned by `worker_id`.
    async fn create_case(&self, worker_id: &str, case: &NewCase) -> Res<PatientCase>;

    /// Gets a case by its ID.
    async fn get_case(&self, case_id: &str) -> Res<Option<PatientCase>>;

    /// Applies a partial update to an existing case.
    ///
    /// Fails when the case does not exist.
    async fn update_case(&self, case_id: &str, update: &CaseUpdate) -> Res<PatientCase>;

    /// Deletes an existing case.
    async fn delete_case(&self, case_id: &str) -> Void;

    /// Lists the cases owned by `worker_id`, newest first.
    async fn list_cases(&self, worker_id: &str) -> Res<Vec<PatientCase>>;

    /// Starts a live stream of insert/update/delete notifications for cases owned by `worker_id`.
    async fn watch_cases(&self, worker_id: &str) -> Res<CaseChangeStream>;
}

// Structs.

/// Case store client for the chw-assistant.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}

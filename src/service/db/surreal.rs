//! SurrealDB implementation of the case store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use surrealdb::{
    Action, Surreal,
    engine::any::{self, Any},
    method::Stream,
    opt::auth::Root,
};
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{AssistantError, CaseChange, CaseChangeKind, CaseUpdate, Err, NewCase, PatientCase, Res, Void},
};

use super::{CaseChangeStream, DbClient, GenericDbClient};

const CASE_TABLE: &str = "patient_case";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the SurrealDB endpoint named by the configuration.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let client = SurrealDbClient::connect(
            &config.db_endpoint,
            &config.db_username,
            &config.db_password,
            &config.db_namespace,
            &config.db_database,
        )
        .await?;

        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates an embedded, in-memory store.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::connect("mem://", "", "", "chw", "cases").await?;

        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// SurrealDB case store.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Connect, sign in (when credentials are given), and prepare the case table.
    #[instrument(name = "SurrealDbClient::connect", skip(username, password))]
    pub async fn connect(endpoint: &str, username: &str, password: &str, namespace: &str, database: &str) -> Res<Self> {
        let db = any::connect(endpoint).await.map_err(store_error)?;

        if !username.is_empty() {
            db.signin(Root { username, password }).await.map_err(store_error)?;
        }

        db.use_ns(namespace).use_db(database).await.map_err(store_error)?;

        // Cases are queried by owner.
        db.query(format!("DEFINE TABLE IF NOT EXISTS {CASE_TABLE} SCHEMALESS;"))
            .query(format!("DEFINE INDEX IF NOT EXISTS {CASE_TABLE}_worker ON {CASE_TABLE} FIELDS worker_id;"))
            .await
            .map_err(store_error)?
            .check()
            .map_err(store_error)?;

        info!("Case store initialized at `{endpoint}`.");

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self, case))]
    async fn create_case(&self, worker_id: &str, case: &NewCase) -> Res<PatientCase> {
        let now = Utc::now();
        let case_id = uuid::Uuid::new_v4().to_string();

        let record = PatientCase {
            id: case_id.clone(),
            worker_id: worker_id.to_string(),
            patient_name: case.patient_name.clone(),
            patient_age: case.patient_age,
            village: case.village.clone(),
            phone_number: case.phone_number.clone(),
            blood_group: case.blood_group.clone(),
            case_type: case.case_type,
            status: Some(case.status),
            priority: Some(case.priority),
            category: Some(case.category),
            summary: case.summary.clone(),
            case_data: case.case_data.clone(),
            is_referred: false,
            referral_facility: None,
            follow_up_date: None,
            created_at: now,
            updated_at: now,
        };

        let created: Option<PatientCase> = self.db.create((CASE_TABLE, case_id.as_str())).content(record).await.map_err(store_error)?;

        info!("Case `{}` created.", case_id);

        created.ok_or_else(|| AssistantError::transport(format!("Case store did not return case `{case_id}`.")))
    }

    #[instrument(skip(self))]
    async fn get_case(&self, case_id: &str) -> Res<Option<PatientCase>> {
        let case: Option<PatientCase> = self.db.select((CASE_TABLE, case_id)).await.map_err(store_error)?;

        Ok(case)
    }

    #[instrument(skip(self, update))]
    async fn update_case(&self, case_id: &str, update: &CaseUpdate) -> Res<PatientCase> {
        if self.get_case(case_id).await?.is_none() {
            return Err(AssistantError::transport(format!("Case `{case_id}` not found.")));
        }

        let mut patch = serde_json::to_value(update)?;
        patch["updated_at"] = serde_json::to_value(Utc::now())?;

        let updated: Option<PatientCase> = self.db.update((CASE_TABLE, case_id)).merge(patch).await.map_err(store_error)?;

        info!("Case `{}` updated.", case_id);

        updated.ok_or_else(|| AssistantError::transport(format!("Case `{case_id}` not found.")))
    }

    #[instrument(skip(self))]
    async fn delete_case(&self, case_id: &str) -> Void {
        let deleted: Option<PatientCase> = self.db.delete((CASE_TABLE, case_id)).await.map_err(store_error)?;

        if deleted.is_none() {
            return Err(AssistantError::transport(format!("Case `{case_id}` not found.")));
        }

        info!("Case `{}` deleted.", case_id);

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_cases(&self, worker_id: &str) -> Res<Vec<PatientCase>> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {CASE_TABLE} WHERE worker_id = $worker_id"))
            .bind(("worker_id", worker_id.to_string()))
            .await
            .map_err(store_error)?;

        let mut cases: Vec<PatientCase> = response.take(0).map_err(store_error)?;
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!("Found {} cases for worker `{}`.", cases.len(), worker_id);

        Ok(cases)
    }

    #[instrument(skip(self))]
    async fn watch_cases(&self, worker_id: &str) -> Res<CaseChangeStream> {
        let stream: Stream<Vec<PatientCase>> = self.db.select(CASE_TABLE).live().await.map_err(store_error)?;
        let worker_id = worker_id.to_string();

        info!("Live case query started for worker `{}`.", worker_id);

        let changes = stream.filter_map(move |notification| {
            let worker_id = worker_id.clone();

            async move {
                let notification = match notification {
                    Ok(notification) => notification,
                    Err(err) => return Some(Err(store_error(err))),
                };

                if notification.data.worker_id != worker_id {
                    return None;
                }

                let kind = match notification.action {
                    Action::Create => CaseChangeKind::Insert,
                    Action::Update => CaseChangeKind::Update,
                    Action::Delete => CaseChangeKind::Delete,
                    _ => return None,
                };

                Some(Ok(CaseChange { kind, case: notification.data }))
            }
        });

        Ok(changes.boxed())
    }
}

/// Raise a store error as a transport failure.
fn store_error(err: surrealdb::Error) -> Err {
    AssistantError::transport(format!("case store error: {err}"))
}

// Tests.

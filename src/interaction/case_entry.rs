//! Recording a new patient case.

use serde_json::Value;

use crate::{
    base::types::{CaseStatus, CasePriority, CaseType, NewCase, PatientCase},
    prelude::*,
    service::{db::DbClient, notify::NotifierClient},
};

/// The form a worker fills in for a new case, as typed.
#[derive(Debug, Clone)]
pub struct CaseEntry {
    pub case_type: CaseType,
    pub patient_name: String,
    pub age: String,
    pub village: String,
    pub blood_group: String,
    pub phone_number: String,
}

impl CaseEntry {
    pub fn new(case_type: CaseType, patient_name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            case_type,
            patient_name: patient_name.into(),
            age: age.into(),
            village: String::new(),
            blood_group: String::new(),
            phone_number: String::new(),
        }
    }

    pub fn with_village(mut self, village: impl Into<String>) -> Self {
        self.village = village.into();
        self
    }

    /// Check the form and build the case to store.
    pub fn validate(&self) -> Res<NewCase> {
        let patient_name = self.patient_name.trim();
        let age = self.age.trim();

        if patient_name.is_empty() || age.is_empty() {
            return Err(AssistantError::validation("Please enter patient name and age"));
        }

        let patient_age = age
            .parse::<u32>()
            .map_err(|_| AssistantError::validation(format!("Age must be a whole number of years, not `{age}`.")))?;

        Ok(NewCase {
            patient_name: patient_name.to_string(),
            patient_age: Some(patient_age),
            village: optional(&self.village),
            phone_number: optional(&self.phone_number),
            blood_group: optional(&self.blood_group),
            case_type: self.case_type,
            status: CaseStatus::Active,
            priority: CasePriority::Normal,
            category: self.case_type.category(),
            summary: Some(format!("New {} case for {}", self.case_type.as_str(), patient_name)),
            case_data: Value::Object(Default::default()),
        })
    }
}

/// Validate and store a case for the signed-in worker, notifying the outcome.
#[instrument(skip_all)]
pub async fn save_case(db: &DbClient, notifier: &NotifierClient, session: &Session, entry: &CaseEntry) -> Res<PatientCase> {
    let new_case = match entry.validate() {
        Ok(new_case) => new_case,
        Err(err) => {
            show(notifier, Notice::from_error(&err)).await;
            return Err(err);
        }
    };

    match db.create_case(&session.worker_id, &new_case).await {
        Ok(case) => {
            info!("Saved case `{}` for worker `{}`.", case.id, session.worker_id);
            show(notifier, Notice::info("Case Saved", "Patient case has been saved successfully.")).await;

            Ok(case)
        }
        Err(err) => {
            error!("Error saving case: {err:#}");
            show(notifier, Notice::destructive("Error", "Failed to save case. Please try again.")).await;

            Err(err)
        }
    }
}

async fn show(notifier: &NotifierClient, notice: Notice) {
    if let Err(err) = notifier.notify(&notice).await {
        warn!("Could not show notice `{}`: {err:#}", notice.title);
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::{
        base::types::{CaseCategory, NoticeVariant},
        service::notify::GenericNotifier,
    };

    mock! {
        pub Notifier {}

        #[async_trait]
        impl GenericNotifier for Notifier {
            async fn notify(&self, notice: &Notice) -> Void;
        }
    }

    fn session() -> Session {
        Session {
            worker_id: "chw-7".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_validate_builds_new_case() {
        let case = CaseEntry::new(CaseType::Pnc, " Meera ", "29").with_village("Rampur").validate().unwrap();

        assert_eq!(case.patient_name, "Meera");
        assert_eq!(case.patient_age, Some(29));
        assert_eq!(case.village.as_deref(), Some("Rampur"));
        assert_eq!(case.phone_number, None);
        assert_eq!(case.category, CaseCategory::PregnantWomen);
        assert_eq!(case.status, CaseStatus::Active);
        assert_eq!(case.priority, CasePriority::Normal);
        assert_eq!(case.summary.as_deref(), Some("New PNC case for Meera"));
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(CaseEntry::new(CaseType::Anc, "A", "20").validate().unwrap().category, CaseCategory::PregnantWomen);
        assert_eq!(CaseEntry::new(CaseType::Child, "B", "2").validate().unwrap().category, CaseCategory::Child);
        assert_eq!(CaseEntry::new(CaseType::General, "C", "60").validate().unwrap().category, CaseCategory::General);
    }

    #[test]
    fn test_missing_age_is_rejected() {
        let err = CaseEntry::new(CaseType::Anc, "Asha", "").validate().unwrap_err();

        assert_eq!(AssistantError::classify(&err), AssistantError::Validation("Please enter patient name and age".to_string()));

        let notice = Notice::from_error(&err);
        assert_eq!(notice.title, "Missing Information");
        assert_eq!(notice.description, "Please enter patient name and age");
    }

    #[test]
    fn test_non_numeric_age_is_rejected() {
        let err = CaseEntry::new(CaseType::Child, "Ravi", "two").validate().unwrap_err();

        assert!(matches!(AssistantError::classify(&err), AssistantError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_case_stores_and_notifies() {
        let db = DbClient::surreal_memory().await.unwrap();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().withf(|notice| notice.title == "Case Saved").times(1).returning(|_| Ok(()));
        let notifier = NotifierClient::new(Arc::new(notifier));

        let case = save_case(&db, &notifier, &session(), &CaseEntry::new(CaseType::Anc, "Asha", "24")).await.unwrap();

        assert_eq!(case.worker_id, "chw-7");
        assert_eq!(db.list_cases("chw-7").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_case_survives_failing_notifier() {
        let db = DbClient::surreal_memory().await.unwrap();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(2).returning(|_| Err(anyhow!("display detached")));
        let notifier = NotifierClient::new(Arc::new(notifier));

        let case = save_case(&db, &notifier, &session(), &CaseEntry::new(CaseType::Child, "Ravi", "4")).await.unwrap();
        let stored = db.list_cases("chw-7").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, case.id);

        let err = save_case(&db, &notifier, &session(), &CaseEntry::new(CaseType::Child, "Ravi", "")).await.unwrap_err();
        assert_eq!(AssistantError::classify(&err), AssistantError::Validation("Please enter patient name and age".to_string()));
        assert_eq!(db.list_cases("chw-7").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_case_rejects_before_storing() {
        let db = DbClient::surreal_memory().await.unwrap();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice| notice.title == "Missing Information" && notice.variant == NoticeVariant::Destructive)
            .times(1)
            .returning(|_| Ok(()));
        let notifier = NotifierClient::new(Arc::new(notifier));

        assert!(save_case(&db, &notifier, &session(), &CaseEntry::new(CaseType::Anc, "", "24")).await.is_err());
        assert!(db.list_cases("chw-7").await.unwrap().is_empty());
    }
}

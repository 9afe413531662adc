//! Shared types: result aliases, the error taxonomy, conversation turns,
//! notices, sessions, and patient cases.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Errors.

/// The failure classes surfaced to a health worker.
///
/// These are raised into [`anyhow::Error`] like any other error, and callers
/// recover the class with [`AssistantError::classify`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// Input rejected locally (empty submission, missing fields, busy).
    #[error("{0}")]
    Validation(String),
    /// Microphone or camera access was refused.
    #[error("permission denied: {0}")]
    Permission(String),
    /// The case store or the LLM backend failed.
    #[error("backend failure: {0}")]
    Transport(String),
    /// A backend is not configured (e.g., a missing credential).
    #[error("not configured: {0}")]
    Configuration(String),
}

impl AssistantError {
    pub fn validation(message: impl Into<String>) -> Err {
        Self::Validation(message.into()).into()
    }

    pub fn permission(message: impl Into<String>) -> Err {
        Self::Permission(message.into()).into()
    }

    pub fn transport(message: impl Into<String>) -> Err {
        Self::Transport(message.into()).into()
    }

    pub fn configuration(message: impl Into<String>) -> Err {
        Self::Configuration(message.into()).into()
    }

    /// Recover the failure class of an arbitrary error.
    ///
    /// Anything that was not raised as an `AssistantError` counts as a transport failure.
    pub fn classify(err: &Err) -> AssistantError {
        err.downcast_ref::<AssistantError>().cloned().unwrap_or_else(|| AssistantError::Transport(format!("{err:#}")))
    }
}

// Conversation.

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in the assistant conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub is_high_risk: bool,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            is_high_risk: false,
        }
    }

    pub fn assistant(text: impl Into<String>, is_high_risk: bool) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            is_high_risk,
        }
    }
}

// Notices.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    #[default]
    Default,
    Destructive,
}

/// A user-visible notification (a "toast").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    /// Convert any failure into the notice a worker should see.
    pub fn from_error(err: &Err) -> Self {
        match AssistantError::classify(err) {
            AssistantError::Validation(message) => Self::destructive("Missing Information", message),
            AssistantError::Permission(message) => Self::destructive("Permission Denied", message),
            AssistantError::Transport(message) => Self::destructive("Error", message),
            AssistantError::Configuration(message) => Self::destructive("Not Configured", message),
        }
    }
}

// Sessions.

/// An authenticated health worker session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub worker_id: String,
    pub email: Option<String>,
}

// Cases.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseType {
    Anc,
    Pnc,
    Child,
    General,
}

impl CaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Anc => "ANC",
            CaseType::Pnc => "PNC",
            CaseType::Child => "CHILD",
            CaseType::General => "GENERAL",
        }
    }

    /// The dashboard category a new case of this type is filed under.
    pub fn category(&self) -> CaseCategory {
        match self {
            CaseType::Anc | CaseType::Pnc => CaseCategory::PregnantWomen,
            CaseType::Child => CaseCategory::Child,
            CaseType::General => CaseCategory::General,
        }
    }
}

impl std::str::FromStr for CaseType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        match s.trim().to_lowercase().as_str() {
            "anc" => Ok(CaseType::Anc),
            "pnc" => Ok(CaseType::Pnc),
            "child" => Ok(CaseType::Child),
            "general" => Ok(CaseType::General),
            _ => Err(AssistantError::validation(format!("Unknown case type `{s}`. Must be one of: anc, pnc, child, general"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Active,
    Followup,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseCategory {
    PregnantWomen,
    Child,
    General,
}

/// A patient case as held by the case store.
///
/// The identifier is stored under `case_id` so that it never collides with a
/// store's own record key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientCase {
    #[serde(rename = "case_id")]
    pub id: String,
    pub worker_id: String,
    pub patient_name: String,
    pub patient_age: Option<u32>,
    pub village: Option<String>,
    pub phone_number: Option<String>,
    pub blood_group: Option<String>,
    pub case_type: CaseType,
    pub status: Option<CaseStatus>,
    pub priority: Option<CasePriority>,
    pub category: Option<CaseCategory>,
    pub summary: Option<String>,
    #[serde(default)]
    pub case_data: Value,
    #[serde(default)]
    pub is_referred: bool,
    pub referral_facility: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a worker supplies when recording a new case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCase {
    pub patient_name: String,
    pub patient_age: Option<u32>,
    pub village: Option<String>,
    pub phone_number: Option<String>,
    pub blood_group: Option<String>,
    pub case_type: CaseType,
    pub status: CaseStatus,
    pub priority: CasePriority,
    pub category: CaseCategory,
    pub summary: Option<String>,
    pub case_data: Value,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<CasePriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_referred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_facility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaseChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change notification from the live case subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseChange {
    pub kind: CaseChangeKind,
    pub case: PatientCase,
}

// Tests.

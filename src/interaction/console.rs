//! A line-oriented front-end over the assistant and the case log.
//!
//! Plain lines are questions for the assistant; lines starting with `/` are
//! commands.

use chrono::Local;
use serde::Serialize;
use serde_json::Value;

use crate::{
    base::types::{CaseStatus, CaseType, PatientCase},
    interaction::{
        assistant::AssistantSession,
        case_entry::{CaseEntry, save_case},
        case_history::{CaseFilter, CaseQuery, CaseStats, StatusFilter},
    },
    prelude::*,
    runtime::Runtime,
    service::{audio::{AudioClient, Recorder}, auth::AuthClient, db::DbClient, notify::NotifierClient},
};

pub const HELP: &str = "Commands:
  /cases [filter] [status] [search]   list your cases
                                      (filter: all, active, follow_up, pregnant_women,
                                       today_followup, high_risk, referrals;
                                       status: all, active, followup, completed)
  /case <id>                          show one case in full
  /stats                              dashboard numbers
  /new <type> <name> <age> [village]  record a case (type: anc, pnc, child, general)
  /voice                              start or stop a voice recording
  /image <path>                       ask about a photo
  /logout                             sign out and leave
  /quit                               leave";

/// What the front-end should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Silent,
    Quit,
}

/// One signed-in worker's console.
pub struct Console {
    db: DbClient,
    auth: AuthClient,
    notifier: NotifierClient,
    session: Session,
    assistant: AssistantSession,
}

impl Console {
    pub fn new(runtime: &Runtime, session: Session, audio: AudioClient) -> Self {
        Self {
            db: runtime.db.clone(),
            auth: runtime.auth.clone(),
            notifier: runtime.notifier.clone(),
            session,
            assistant: AssistantSession::new(runtime.classifier.clone(), runtime.notifier.clone(), Recorder::new(audio)),
        }
    }

    /// The greeting and the quick questions.
    pub async fn greeting(&self) -> String {
        let mut text = self.assistant.turns().await.into_iter().map(|turn| turn.text).collect::<Vec<_>>().join("\n");

        for (index, question) in self.assistant.quick_questions().await.iter().enumerate() {
            text.push_str(&format!("\n  {}. {question}", index + 1));
        }

        text.push_str("\n\nType /help for commands.");
        text
    }

    #[instrument(skip_all)]
    pub async fn handle_line(&self, line: &str) -> Outcome {
        let line = line.trim();

        if line.is_empty() {
            return Outcome::Silent;
        }

        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "/quit" => Outcome::Quit,
            "/help" => Outcome::Reply(HELP.to_string()),
            "/logout" => match self.assistant.handle(self.auth.sign_out().await).await {
                Some(()) => Outcome::Quit,
                None => Outcome::Silent,
            },
            "/cases" => self.reply(self.list_cases(rest).await).await,
            "/case" => self.reply(self.show_case(rest).await).await,
            "/stats" => self.reply(self.stats().await).await,
            "/new" => self.new_case(rest).await,
            "/voice" => {
                let result = self
                    .assistant
                    .toggle_recording()
                    .await
                    .map(|turn| turn.map(|turn| render_turn(&turn)).unwrap_or_else(|| "Recording... type /voice again to stop.".to_string()));

                self.reply(result).await
            }
            "/image" => self.reply(self.image(rest).await).await,
            command if command.starts_with('/') => self.reply(Err(AssistantError::validation(format!("Unknown command `{command}`. Type /help for commands.")))).await,
            _ => self.reply(self.ask(line).await).await,
        }
    }

    async fn reply(&self, result: Res<String>) -> Outcome {
        match self.assistant.handle(result).await {
            Some(text) => Outcome::Reply(text),
            None => Outcome::Silent,
        }
    }

    async fn ask(&self, line: &str) -> Res<String> {
        // A bare number picks a quick question while they are on offer.
        let quick = self.assistant.quick_questions().await;
        let question = match line.parse::<usize>() {
            Ok(index) if (1..=quick.len()).contains(&index) => quick[index - 1],
            _ => line,
        };

        let turn = self.assistant.submit_text(question).await?;

        Ok(render_turn(&turn))
    }

    async fn list_cases(&self, args: &str) -> Res<String> {
        let query = parse_query(args);
        let cases = self.db.list_cases(&self.session.worker_id).await?;

        if cases.is_empty() {
            return Ok("No cases recorded yet.".to_string());
        }

        let found = query.apply(&cases, Local::now().date_naive());

        if found.is_empty() {
            return Ok("No cases match. Try adjusting your search or filters.".to_string());
        }

        let mut text = found.iter().map(|case| render_case(case)).collect::<Vec<_>>().join("\n");
        text.push_str(&format!("\n{} records", found.len()));

        Ok(text)
    }

    async fn show_case(&self, case_id: &str) -> Res<String> {
        if case_id.is_empty() {
            return Err(AssistantError::validation("Usage: /case <id>"));
        }

        match self.db.get_case(case_id).await? {
            Some(case) if case.worker_id == self.session.worker_id => Ok(render_case_detail(&case)),
            _ => Err(AssistantError::validation(format!("No case with id `{case_id}`."))),
        }
    }

    async fn stats(&self) -> Res<String> {
        let cases = self.db.list_cases(&self.session.worker_id).await?;
        let stats = CaseStats::from_cases(&cases, Local::now().date_naive());

        Ok(format!(
            "Active cases: {}\nFollow-ups: {}\nPregnant women: {}\nTotal patients: {}\nToday's follow-ups: {}\nHigh risk: {}\nReferrals: {}",
            stats.active_cases, stats.follow_ups, stats.pregnant_women, stats.total_patients, stats.todays_followups, stats.high_risk, stats.referrals
        ))
    }

    async fn new_case(&self, args: &str) -> Outcome {
        let mut args = args.split_whitespace();

        let case_type = match args.next().unwrap_or_default().parse::<CaseType>() {
            Ok(case_type) => case_type,
            Err(err) => return self.reply(Err(err)).await,
        };

        let name = args.next().unwrap_or_default();
        let age = args.next().unwrap_or_default();
        let village = args.collect::<Vec<_>>().join(" ");

        let entry = CaseEntry::new(case_type, name, age).with_village(village);

        // Saving reports its own outcome through the notifier.
        match save_case(&self.db, &self.notifier, &self.session, &entry).await {
            Ok(case) => Outcome::Reply(format!("Saved: {}", render_case(&case))),
            Err(_) => Outcome::Silent,
        }
    }

    async fn image(&self, path: &str) -> Res<String> {
        if path.is_empty() {
            return Err(AssistantError::validation("Usage: /image <path>"));
        }

        let bytes = tokio::fs::read(path).await.map_err(|err| AssistantError::validation(format!("Could not read `{path}`: {err}")))?;
        let turn = self.assistant.submit_image(&bytes).await?;

        Ok(render_turn(&turn))
    }
}

/// Read `[filter] [status] [search]`; each part is optional, and whatever is
/// not a filter or a status is the name search.
fn parse_query(args: &str) -> CaseQuery {
    let mut query = CaseQuery::default();
    let mut words = args.split_whitespace().peekable();

    if let Some(category) = words.peek().and_then(|word| word.parse::<CaseFilter>().ok()) {
        query.category = category;
        words.next();
    }

    if let Some(status) = words.peek().and_then(|word| word.parse::<StatusFilter>().ok()) {
        query.status = status;
        words.next();
    }

    query.search = words.collect::<Vec<_>>().join(" ");
    query
}

/// Render an assistant turn, with a banner when it is high risk.
pub fn render_turn(turn: &Turn) -> String {
    if turn.is_high_risk {
        format!("🚨 HIGH RISK ALERT: refer or escalate immediately 🚨\n{}", turn.text)
    } else {
        turn.text.clone()
    }
}

fn render_case(case: &PatientCase) -> String {
    let age = case.patient_age.map(|age| format!("{age}y")).unwrap_or_else(|| "age ?".to_string());
    let status = match case.status {
        Some(CaseStatus::Active) => "active",
        Some(CaseStatus::Followup) => "follow-up",
        Some(CaseStatus::Completed) => "completed",
        None => "unknown",
    };
    let village = case.village.as_deref().map(|village| format!(", {village}")).unwrap_or_default();

    format!("{} {} [{}] {} ({age}{village}) {status}", case.id, case.created_at.format("%Y-%m-%d"), case.case_type.as_str(), case.patient_name)
}

fn render_case_detail(case: &PatientCase) -> String {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();

    let mut lines = vec![
        format!("{} [{}]", case.patient_name, case.case_type.as_str()),
        format!("Age: {}", case.patient_age.map(|age| format!("{age} years")).unwrap_or_else(|| "-".to_string())),
        format!("Village: {}", or_dash(case.village.as_deref())),
        format!("Phone: {}", or_dash(case.phone_number.as_deref())),
        format!("Blood group: {}", or_dash(case.blood_group.as_deref())),
        format!("Status: {}", label(&case.status)),
        format!("Priority: {}", label(&case.priority)),
        format!("Category: {}", label(&case.category).replace('_', " ")),
        format!("Summary: {}", or_dash(case.summary.as_deref())),
    ];

    if case.is_referred {
        lines.push(format!("Referred to: {}", or_dash(case.referral_facility.as_deref())));
    }

    if let Some(date) = case.follow_up_date {
        lines.push(format!("Follow-up: {date}"));
    }

    lines.push(format!("Recorded: {}", case.created_at.format("%Y-%m-%d %H:%M")));

    if let Value::Object(fields) = &case.case_data {
        if !fields.is_empty() {
            lines.push("Visit details:".to_string());
        }

        for (key, value) in fields {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };

            lines.push(format!("  {}: {value}", key.replace('_', " ")));
        }
    }

    lines.join("\n")
}

/// The serialized name of a case enum, or `-` when unset.
fn label<T: Serialize>(value: &Option<T>) -> String {
    match value.as_ref().map(serde_json::to_value) {
        Some(Ok(Value::String(text))) => text,
        _ => "-".to_string(),
    }
}

// Tests.

//! Rule-based triage responder.
//!
//! Free text is matched against an ordered list of topics. Each topic is a
//! conjunction of substrings over the lowercased input, and the first topic
//! that matches selects the canned guidance. Input that matches nothing gets a
//! clarification prompt that quotes it back unchanged.

pub mod risk;
pub mod templates;

use serde::{Deserialize, Serialize};

/// A guidance topic the responder can recognize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Topic {
    PregnancyDangerSigns,
    VaccinationSchedule,
    ChildFever,
    PregnancyNutrition,
    MediaAcknowledgment,
    Clarification,
}

/// Matchable topics in priority order; `Clarification` is the fallback.
pub const RULES: [Topic; 5] = [
    Topic::PregnancyDangerSigns,
    Topic::VaccinationSchedule,
    Topic::ChildFever,
    Topic::PregnancyNutrition,
    Topic::MediaAcknowledgment,
];

impl Topic {
    /// Evaluate this topic's predicate against already-lowercased text.
    pub fn matches(&self, normalized: &str) -> bool {
        let has = |token: &str| normalized.contains(token);

        match self {
            Topic::PregnancyDangerSigns => has("danger") && has("pregnan"),
            Topic::VaccinationSchedule => has("vaccination") || has("vaccine"),
            Topic::ChildFever => has("fever") && has("child"),
            Topic::PregnancyNutrition => has("nutrition") && has("pregnan"),
            Topic::MediaAcknowledgment => has("voice") || has("image"),
            Topic::Clarification => true,
        }
    }

    /// Render the guidance for this topic.
    pub fn respond(&self, original: &str, normalized: &str) -> String {
        match self {
            Topic::PregnancyDangerSigns => templates::PREGNANCY_DANGER_SIGNS.to_string(),
            Topic::VaccinationSchedule => templates::VACCINATION_SCHEDULE.to_string(),
            Topic::ChildFever => templates::CHILD_FEVER.to_string(),
            Topic::PregnancyNutrition => templates::PREGNANCY_NUTRITION.to_string(),
            Topic::MediaAcknowledgment => templates::media_acknowledgment(if normalized.contains("voice") { "voice" } else { "image" }),
            Topic::Clarification => templates::clarification(original),
        }
    }
}

/// The outcome of triaging one input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Triage {
    pub topic: Topic,
    pub response_text: String,
    pub is_high_risk: bool,
}

/// Select the topic for `input` (first match wins).
pub fn select_topic(input: &str) -> Topic {
    first_match(&input.to_lowercase())
}

fn first_match(normalized: &str) -> Topic {
    RULES.into_iter().find(|topic| topic.matches(normalized)).unwrap_or(Topic::Clarification)
}

/// Triage a non-empty input.
///
/// The risk flag is computed from the input itself; see [`risk::input_is_high_risk`].
pub fn classify(input: &str) -> Triage {
    let normalized = input.to_lowercase();
    let topic = first_match(&normalized);

    Triage {
        topic,
        response_text: topic.respond(input, &normalized),
        is_high_risk: risk::input_is_high_risk(input),
    }
}

// Tests.

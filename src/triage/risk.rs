//! Keyword-based high-risk detection.
//!
//! Two strategies exist and they look at different text: the static rule
//! table flags on what the worker typed, while an LLM-served answer is
//! flagged on what the model produced.

use serde::{Deserialize, Serialize};

/// Emergency terms scanned in the worker's input.
pub const INPUT_RISK_TERMS: [&str; 2] = ["bleeding", "unconscious"];

/// Emergency terms scanned in a generated response.
pub const RESPONSE_RISK_TERMS: [&str; 6] = ["bleeding", "unconscious", "convulsion", "severe", "emergency", "refer immediately"];

/// Which text a risk flag was computed from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskSource {
    Input,
    Response,
}

/// Flag the original input of a turn.
pub fn input_is_high_risk(input: &str) -> bool {
    contains_any(input, &INPUT_RISK_TERMS)
}

/// Flag a produced response text.
pub fn response_is_high_risk(response: &str) -> bool {
    contains_any(response, &RESPONSE_RISK_TERMS)
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    let text = text.to_lowercase();
    terms.iter().any(|term| text.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_terms() {
        assert!(input_is_high_risk("severe bleeding at 32 weeks"));
        assert!(input_is_high_risk("Baby is UNCONSCIOUS"));
        assert!(!input_is_high_risk("mother has a severe headache"));
    }

    #[test]
    fn test_response_terms() {
        assert!(response_is_high_risk("Please Refer Immediately to the district hospital."));
        assert!(response_is_high_risk("Watch for convulsions."));
        assert!(!response_is_high_risk("Give plenty of fluids and rest."));
    }
}

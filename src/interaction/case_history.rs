//! Dashboard numbers and case list filtering.
//!
//! Every dashboard count is the size of one [`CaseFilter`], so tapping a
//! number always lists exactly the cases it counted.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::{
    base::types::{CaseCategory, CasePriority, CaseStatus, PatientCase},
    prelude::*,
};

/// A dashboard category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFilter {
    #[default]
    All,
    Active,
    FollowUp,
    PregnantWomen,
    TodayFollowup,
    HighRisk,
    Referrals,
}

impl CaseFilter {
    pub fn matches(&self, case: &PatientCase, today: NaiveDate) -> bool {
        match self {
            CaseFilter::All => true,
            CaseFilter::Active => case.status == Some(CaseStatus::Active),
            CaseFilter::FollowUp => case.follow_up_date.is_some_and(|date| date >= today),
            CaseFilter::PregnantWomen => case.category == Some(CaseCategory::PregnantWomen),
            CaseFilter::TodayFollowup => case.follow_up_date == Some(today),
            CaseFilter::HighRisk => case.priority == Some(CasePriority::High),
            CaseFilter::Referrals => case.is_referred,
        }
    }

    fn count(&self, cases: &[PatientCase], today: NaiveDate) -> usize {
        cases.iter().filter(|case| self.matches(case, today)).count()
    }
}

impl FromStr for CaseFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        match s.trim() {
            "all" => Ok(CaseFilter::All),
            "active" => Ok(CaseFilter::Active),
            "follow_up" => Ok(CaseFilter::FollowUp),
            "pregnant_women" => Ok(CaseFilter::PregnantWomen),
            "today_followup" => Ok(CaseFilter::TodayFollowup),
            "high_risk" => Ok(CaseFilter::HighRisk),
            "referrals" => Ok(CaseFilter::Referrals),
            other => Err(AssistantError::validation(format!("Unknown case filter `{other}`."))),
        }
    }
}

/// The status selector on the case list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CaseStatus),
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        match s.trim() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Only(CaseStatus::Active)),
            "followup" => Ok(StatusFilter::Only(CaseStatus::Followup)),
            "completed" => Ok(StatusFilter::Only(CaseStatus::Completed)),
            other => Err(AssistantError::validation(format!("Unknown status `{other}`. Must be one of: all, active, followup, completed"))),
        }
    }
}

/// A name search combined with the status and category selectors.
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
    pub search: String,
    pub status: StatusFilter,
    pub category: CaseFilter,
}

impl CaseQuery {
    /// The cases that match, in their original order.
    pub fn apply<'a>(&self, cases: &'a [PatientCase], today: NaiveDate) -> Vec<&'a PatientCase> {
        let needle = self.search.trim().to_lowercase();

        cases
            .iter()
            .filter(|case| case.patient_name.to_lowercase().contains(&needle))
            .filter(|case| match self.status {
                StatusFilter::All => true,
                StatusFilter::Only(status) => case.status == Some(status),
            })
            .filter(|case| self.category.matches(case, today))
            .collect()
    }
}

/// The dashboard numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaseStats {
    pub active_cases: usize,
    pub follow_ups: usize,
    pub pregnant_women: usize,
    pub total_patients: usize,
    pub todays_followups: usize,
    pub high_risk: usize,
    pub referrals: usize,
}

impl CaseStats {
    pub fn from_cases(cases: &[PatientCase], today: NaiveDate) -> Self {
        Self {
            active_cases: CaseFilter::Active.count(cases, today),
            follow_ups: CaseFilter::FollowUp.count(cases, today),
            pregnant_women: CaseFilter::PregnantWomen.count(cases, today),
            total_patients: cases.len(),
            todays_followups: CaseFilter::TodayFollowup.count(cases, today),
            high_risk: CaseFilter::HighRisk.count(cases, today),
            referrals: CaseFilter::Referrals.count(cases, today),
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use chrono::{Days, Utc};
    use serde_json::Value;

    use super::*;
    use crate::base::types::CaseType;

    fn case(name: &str, status: CaseStatus, category: CaseCategory) -> PatientCase {
        PatientCase {
            id: name.to_lowercase(),
            worker_id: "chw-1".to_string(),
            patient_name: name.to_string(),
            patient_age: Some(30),
            village: None,
            phone_number: None,
            blood_group: None,
            case_type: CaseType::General,
            status: Some(status),
            priority: Some(CasePriority::Normal),
            category: Some(category),
            summary: None,
            case_data: Value::Null,
            is_referred: false,
            referral_facility: None,
            follow_up_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn sample() -> Vec<PatientCase> {
        let mut asha = case("Asha Devi", CaseStatus::Active, CaseCategory::PregnantWomen);
        asha.follow_up_date = Some(today());
        asha.priority = Some(CasePriority::High);

        let mut ravi = case("Ravi", CaseStatus::Followup, CaseCategory::Child);
        ravi.follow_up_date = today().checked_add_days(Days::new(3));
        ravi.is_referred = true;

        let mut meera = case("Meera", CaseStatus::Completed, CaseCategory::PregnantWomen);
        meera.follow_up_date = today().checked_sub_days(Days::new(1));

        let gopal = case("Gopal", CaseStatus::Active, CaseCategory::General);

        vec![asha, ravi, meera, gopal]
    }

    #[test]
    fn test_stats_count_each_category() {
        let stats = CaseStats::from_cases(&sample(), today());

        assert_eq!(
            stats,
            CaseStats {
                active_cases: 2,
                follow_ups: 2,
                pregnant_women: 2,
                total_patients: 4,
                todays_followups: 1,
                high_risk: 1,
                referrals: 1,
            }
        );
    }

    #[test]
    fn test_stats_of_nothing() {
        assert_eq!(CaseStats::from_cases(&[], today()), CaseStats::default());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let cases = sample();
        let query = CaseQuery {
            search: "ASHA".to_string(),
            ..Default::default()
        };

        let found = query.apply(&cases, today());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].patient_name, "Asha Devi");
    }

    #[test]
    fn test_status_and_category_combine() {
        let cases = sample();
        let query = CaseQuery {
            search: String::new(),
            status: "active".parse().unwrap(),
            category: "pregnant_women".parse().unwrap(),
        };

        let found = query.apply(&cases, today());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].patient_name, "Asha Devi");
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("today_followup".parse::<CaseFilter>().unwrap(), CaseFilter::TodayFollowup);
        assert_eq!("followup".parse::<StatusFilter>().unwrap(), StatusFilter::Only(CaseStatus::Followup));
        assert!("pending".parse::<StatusFilter>().is_err());
        assert!("urgent".parse::<CaseFilter>().is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::EvaluationStatus;

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub initiated_appraisal_id: Uuid,
    pub frequency_calendar_detail_id: Option<Uuid>,
    pub self_evaluation: Option<Value>,
    pub self_submitted_at: Option<DateTime<Utc>>,
    pub manager_evaluation: Option<Value>,
    pub manager_submitted_at: Option<DateTime<Utc>>,
    pub overall_rating: Option<f64>,
    pub status: EvaluationStatus,
    pub meeting_scheduled_at: Option<DateTime<Utc>>,
    pub meeting_notes: Option<String>,
    pub show_notes_to_employee: bool,
    pub meeting_completed_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Meeting notes are hidden from the employee until the manager opts in.
    pub fn redacted_for_employee(mut self) -> Self {
        if !self.show_notes_to_employee {
            self.meeting_notes = None;
        }
        self.manager_evaluation = None;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationFilter {
    pub initiated_appraisal_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub status: Option<EvaluationStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelfSubmission {
    pub answers: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerSubmission {
    pub answers: Value,
    pub overall_rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRequest {
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingCompletion {
    pub notes: Option<String>,
    pub show_notes_to_employee: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinalizeRequest {
    pub overall_rating: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvaluationStatus;
    use pretty_assertions::assert_eq;

    fn evaluation(show_notes: bool) -> Evaluation {
        Evaluation {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            manager_id: Some(Uuid::new_v4()),
            initiated_appraisal_id: Uuid::new_v4(),
            frequency_calendar_detail_id: None,
            self_evaluation: None,
            self_submitted_at: None,
            manager_evaluation: Some(serde_json::json!({"q1": "strong"})),
            manager_submitted_at: None,
            overall_rating: None,
            status: EvaluationStatus::MeetingCompleted,
            meeting_scheduled_at: None,
            meeting_notes: Some("candid discussion".to_string()),
            show_notes_to_employee: show_notes,
            meeting_completed_at: None,
            finalized_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn redaction_hides_notes_unless_shared() {
        let hidden = evaluation(false).redacted_for_employee();
        assert_eq!(hidden.meeting_notes, None);
        assert_eq!(hidden.manager_evaluation, None);

        let shared = evaluation(true).redacted_for_employee();
        assert_eq!(shared.meeting_notes, Some("candid discussion".to_string()));
        assert_eq!(shared.manager_evaluation, None);
    }
}

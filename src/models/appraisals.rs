use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppraisalStatus, AppraisalType, PublishType, TaskKind, TaskStatus};

/// A concrete review process launched for one appraisal group. Timing knobs
/// on the appraisal are defaults; per-period overrides live in
/// [`DetailTiming`].
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedAppraisal {
    pub id: Uuid,
    pub appraisal_group_id: Uuid,
    pub appraisal_type: AppraisalType,
    pub questionnaire_template_ids: Vec<Uuid>,
    pub document_url: Option<String>,
    pub frequency_calendar_id: Option<Uuid>,
    pub days_to_initiate: i32,
    pub days_to_close: i32,
    pub number_of_reminders: i32,
    pub exclude_tenure_under_year: bool,
    pub excluded_employee_ids: Vec<Uuid>,
    pub status: AppraisalStatus,
    pub make_public: bool,
    pub publish_type: PublishType,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInitiatedAppraisal {
    pub appraisal_group_id: Uuid,
    pub appraisal_type: AppraisalType,
    pub questionnaire_template_ids: Option<Vec<Uuid>>,
    pub document_url: Option<String>,
    pub frequency_calendar_id: Option<Uuid>,
    pub days_to_initiate: Option<i32>,
    pub days_to_close: Option<i32>,
    pub number_of_reminders: Option<i32>,
    pub exclude_tenure_under_year: Option<bool>,
    pub excluded_employee_ids: Option<Vec<Uuid>>,
    pub make_public: Option<bool>,
    pub publish_type: Option<PublishType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiatedAppraisalPatch {
    pub appraisal_group_id: Option<Uuid>,
    pub appraisal_type: Option<AppraisalType>,
    pub questionnaire_template_ids: Option<Vec<Uuid>>,
    pub document_url: Option<String>,
    pub frequency_calendar_id: Option<Uuid>,
    pub days_to_initiate: Option<i32>,
    pub days_to_close: Option<i32>,
    pub number_of_reminders: Option<i32>,
    pub exclude_tenure_under_year: Option<bool>,
    pub excluded_employee_ids: Option<Vec<Uuid>>,
    pub make_public: Option<bool>,
    pub publish_type: Option<PublishType>,
}

/// Per-period override of the timing knobs for one frequency-calendar detail.
#[derive(Debug, Clone, Serialize)]
pub struct DetailTiming {
    pub id: Uuid,
    pub initiated_appraisal_id: Uuid,
    pub frequency_calendar_detail_id: Uuid,
    pub days_to_initiate: i32,
    pub days_to_close: i32,
    pub number_of_reminders: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDetailTiming {
    pub frequency_calendar_detail_id: Uuid,
    pub days_to_initiate: Option<i32>,
    pub days_to_close: Option<i32>,
    pub number_of_reminders: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledAppraisalTask {
    pub id: Uuid,
    pub initiated_appraisal_id: Uuid,
    pub frequency_calendar_detail_id: Option<Uuid>,
    pub kind: TaskKind,
    pub scheduled_on: NaiveDate,
    pub status: TaskStatus,
    pub executed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Status;

#[derive(Debug, Clone, Serialize)]
pub struct AppraisalCycle {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppraisalCycle {
    pub code: String,
    pub description: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppraisalCyclePatch {
    pub code: Option<String>,
    pub description: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub status: Option<Status>,
}

/// Joins an appraisal cycle to a review cadence; its details carry the
/// concrete period windows.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyCalendar {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub appraisal_cycle_id: Uuid,
    pub review_frequency_id: Uuid,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFrequencyCalendar {
    pub code: String,
    pub description: String,
    pub appraisal_cycle_id: Uuid,
    pub review_frequency_id: Uuid,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrequencyCalendarPatch {
    pub code: Option<String>,
    pub description: Option<String>,
    pub appraisal_cycle_id: Option<Uuid>,
    pub review_frequency_id: Option<Uuid>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrequencyCalendarDetail {
    pub id: Uuid,
    pub frequency_calendar_id: Uuid,
    pub display_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFrequencyCalendarDetail {
    pub frequency_calendar_id: Uuid,
    pub display_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrequencyCalendarDetailPatch {
    pub display_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<Status>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Category, PublishType, Status, UserRole};

/// A reusable set of evaluation questions. `questions` is an opaque JSON
/// document authored by the tenant; the backend round-trips it untouched.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionnaireTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub target_role: UserRole,
    pub applicable_category: Option<Category>,
    pub applicable_level_id: Option<Uuid>,
    pub applicable_grade_id: Option<Uuid>,
    pub applicable_location_id: Option<Uuid>,
    pub send_on_mail: bool,
    pub questions: Value,
    pub year: Option<i32>,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestionnaireTemplate {
    pub name: String,
    pub description: Option<String>,
    pub target_role: UserRole,
    pub applicable_category: Option<Category>,
    pub applicable_level_id: Option<Uuid>,
    pub applicable_grade_id: Option<Uuid>,
    pub applicable_location_id: Option<Uuid>,
    pub send_on_mail: Option<bool>,
    pub questions: Option<Value>,
    pub year: Option<i32>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionnaireTemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_role: Option<UserRole>,
    pub applicable_category: Option<Category>,
    pub applicable_level_id: Option<Uuid>,
    pub applicable_grade_id: Option<Uuid>,
    pub applicable_location_id: Option<Uuid>,
    pub send_on_mail: Option<bool>,
    pub questions: Option<Value>,
    pub year: Option<i32>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishQuestionnaire {
    pub id: Uuid,
    pub code: String,
    pub display_name: String,
    pub template_id: Uuid,
    pub frequency_calendar_id: Option<Uuid>,
    pub status: Status,
    pub publish_type: PublishType,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPublishQuestionnaire {
    pub code: String,
    pub display_name: String,
    pub template_id: Uuid,
    pub frequency_calendar_id: Option<Uuid>,
    pub status: Option<Status>,
    pub publish_type: Option<PublishType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishQuestionnairePatch {
    pub code: Option<String>,
    pub display_name: Option<String>,
    pub template_id: Option<Uuid>,
    pub frequency_calendar_id: Option<Uuid>,
    pub status: Option<Status>,
    pub publish_type: Option<PublishType>,
}

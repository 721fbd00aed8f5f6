use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Status;

#[derive(Debug, Clone, Serialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub client_contact: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub gst_number: Option<String>,
    pub logo_url: Option<String>,
    pub url: Option<String>,
    pub company_url: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub address: Option<String>,
    pub client_contact: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub gst_number: Option<String>,
    pub logo_url: Option<String>,
    pub url: Option<String>,
    pub company_url: Option<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub client_contact: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub gst_number: Option<String>,
    pub logo_url: Option<String>,
    pub url: Option<String>,
    pub company_url: Option<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub code: String,
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub status: Option<Status>,
}

/// Levels, grades, departments, and review frequencies share one shape:
/// an owner-scoped `code` + `description` row with a soft status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Level,
    Grade,
    Department,
    ReviewFrequency,
}

impl CodeKind {
    pub fn table(self) -> &'static str {
        match self {
            CodeKind::Level => "perfcycle.levels",
            CodeKind::Grade => "perfcycle.grades",
            CodeKind::Department => "perfcycle.departments",
            CodeKind::ReviewFrequency => "perfcycle.review_frequencies",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CodeKind::Level => "level",
            CodeKind::Grade => "grade",
            CodeKind::Department => "department",
            CodeKind::ReviewFrequency => "review frequency",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeEntry {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCodeEntry {
    pub code: String,
    pub description: String,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeEntryPatch {
    pub code: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Status, UserRole};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub code: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub mobile_number: Option<String>,
    pub reporting_manager_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub level_id: Option<Uuid>,
    pub grade_id: Option<Uuid>,
    pub role: UserRole,
    pub status: Status,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Best-effort human name for notifications: full name, else email, else code.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .email
                .clone()
                .or_else(|| self.code.clone())
                .unwrap_or_else(|| self.id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub code: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub mobile_number: Option<String>,
    pub reporting_manager_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub level_id: Option<Uuid>,
    pub grade_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub code: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub mobile_number: Option<String>,
    pub reporting_manager_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub level_id: Option<Uuid>,
    pub grade_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub status: Option<Status>,
    pub company_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn bare_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: None,
            first_name: None,
            last_name: None,
            code: None,
            designation: None,
            department: None,
            date_of_joining: None,
            mobile_number: None,
            reporting_manager_id: None,
            location_id: None,
            company_id: None,
            level_id: None,
            grade_id: None,
            role: UserRole::Employee,
            status: Status::Active,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut user = bare_user();
        user.first_name = Some("Avery".to_string());
        user.last_name = Some("Lee".to_string());
        user.email = Some("avery@example.com".to_string());
        assert_eq!(user.display_name(), "Avery Lee");
    }

    #[test]
    fn display_name_falls_back_to_email_then_code() {
        let mut user = bare_user();
        user.email = Some("avery@example.com".to_string());
        assert_eq!(user.display_name(), "avery@example.com");

        user.email = None;
        user.code = Some("EMP-042".to_string());
        assert_eq!(user.display_name(), "EMP-042");
    }
}

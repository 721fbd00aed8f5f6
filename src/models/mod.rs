use serde::{Deserialize, Serialize};

pub mod appraisals;
pub mod cycles;
pub mod evaluations;
pub mod groups;
pub mod notify;
pub mod org;
pub mod people;
pub mod templates;

pub use appraisals::{
    DetailTiming, InitiatedAppraisal, InitiatedAppraisalPatch, NewDetailTiming,
    NewInitiatedAppraisal, ScheduledAppraisalTask,
};
pub use cycles::{
    AppraisalCycle, AppraisalCyclePatch, FrequencyCalendar, FrequencyCalendarDetail,
    FrequencyCalendarDetailPatch, FrequencyCalendarPatch, NewAppraisalCycle,
    NewFrequencyCalendar, NewFrequencyCalendarDetail,
};
pub use evaluations::{
    Evaluation, EvaluationFilter, FinalizeRequest, ManagerSubmission, MeetingCompletion,
    MeetingRequest, SelfSubmission,
};
pub use groups::{AppraisalGroup, AppraisalGroupMember, GroupPatch, GroupWithMembers, NewGroup, NewGroupMember};
pub use notify::{
    CalendarCredential, CalendarCredentialPatch, EmailConfig, EmailConfigPatch, EmailTemplate,
    EmailTemplatePatch, NewCalendarCredential, NewEmailConfig, NewEmailTemplate,
};
pub use org::{CodeEntry, CodeEntryPatch, CodeKind, Company, CompanyPatch, Location, LocationPatch, NewCodeEntry, NewCompany, NewLocation};
pub use people::{NewUser, User, UserFilter, UserPatch};
pub use templates::{
    NewPublishQuestionnaire, NewQuestionnaireTemplate, PublishQuestionnaire,
    PublishQuestionnairePatch, QuestionnaireTemplate, QuestionnaireTemplatePatch,
};

/// A status string from the database that no enum variant covers.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(
    /// Soft lifecycle state shared by reference data.
    Status {
        Active => "active",
        Inactive => "inactive",
    }
);

impl Default for Status {
    fn default() -> Self {
        Status::Active
    }
}

text_enum!(UserRole {
    SuperAdmin => "super_admin",
    Admin => "admin",
    HrManager => "hr_manager",
    Manager => "manager",
    Employee => "employee",
});

text_enum!(Category {
    Employee => "employee",
    Manager => "manager",
});

text_enum!(PublishType {
    Now => "now",
    AsPerCalendar => "as_per_calendar",
});

text_enum!(AppraisalType {
    QuestionnaireBased => "questionnaire_based",
    KpiBased => "kpi_based",
    MboBased => "mbo_based",
    OkrBased => "okr_based",
});

text_enum!(
    /// Lifecycle of an initiated appraisal.
    AppraisalStatus {
        Draft => "draft",
        Active => "active",
        Closed => "closed",
        Cancelled => "cancelled",
    }
);

text_enum!(EvaluationStatus {
    Pending => "pending",
    SelfSubmitted => "self_submitted",
    ManagerSubmitted => "manager_submitted",
    MeetingScheduled => "meeting_scheduled",
    MeetingCompleted => "meeting_completed",
    Finalized => "finalized",
    Expired => "expired",
});

text_enum!(TaskKind {
    Initiate => "initiate",
    Remind => "remind",
    Close => "close",
});

text_enum!(TaskStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

text_enum!(CalendarProviderKind {
    Google => "google",
    Outlook => "outlook",
});

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn enum_text_round_trips() {
        for status in [AppraisalStatus::Draft, AppraisalStatus::Active, AppraisalStatus::Closed, AppraisalStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<AppraisalStatus>().unwrap(), status);
        }
        assert_eq!("meeting_scheduled".parse::<EvaluationStatus>().unwrap(), EvaluationStatus::MeetingScheduled);
        assert_eq!(EvaluationStatus::SelfSubmitted.to_string(), "self_submitted");
    }

    #[test]
    fn unknown_variant_is_reported_with_kind() {
        let err = "archived".parse::<Status>().unwrap_err();
        assert_eq!(err.to_string(), "unknown Status value `archived`");
    }

    #[test]
    fn serde_names_match_database_text() {
        let json = serde_json::to_string(&TaskKind::Initiate).unwrap();
        assert_eq!(json, "\"initiate\"");
        let parsed: PublishType = serde_json::from_str("\"as_per_calendar\"").unwrap();
        assert_eq!(parsed, PublishType::AsPerCalendar);
    }
}

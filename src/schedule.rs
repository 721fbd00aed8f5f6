use chrono::{Duration, Months, NaiveDate};
use uuid::Uuid;

use crate::models::{
    DetailTiming, FrequencyCalendarDetail, InitiatedAppraisal, PublishType, Status, TaskKind, User,
};

/// Timing knobs resolved for one period window. Days are kept signed so a
/// negative `days_to_initiate` can pull initiation before the window ends;
/// `days_to_close` is clamped so close never precedes initiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub days_to_initiate: i64,
    pub days_to_close: i64,
    pub number_of_reminders: u32,
}

impl Timing {
    fn new(days_to_initiate: i32, days_to_close: i32, number_of_reminders: i32) -> Self {
        Timing {
            days_to_initiate: i64::from(days_to_initiate),
            days_to_close: i64::from(days_to_close.max(0)),
            number_of_reminders: number_of_reminders.max(0) as u32,
        }
    }
}

/// One row to materialize in `scheduled_appraisal_tasks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub frequency_calendar_detail_id: Option<Uuid>,
    pub kind: TaskKind,
    pub scheduled_on: NaiveDate,
}

/// The per-period override wins over the appraisal's defaults.
pub fn resolve_timing(appraisal: &InitiatedAppraisal, timing: Option<&DetailTiming>) -> Timing {
    match timing {
        Some(t) => Timing::new(t.days_to_initiate, t.days_to_close, t.number_of_reminders),
        None => Timing::new(
            appraisal.days_to_initiate,
            appraisal.days_to_close,
            appraisal.number_of_reminders,
        ),
    }
}

/// Reminder dates evenly spaced over the open interval
/// (`initiate_on`, `close_on`). Dates that collapse onto an endpoint or onto
/// each other (narrow spans) are dropped, so the result may be shorter than
/// `count`.
pub fn reminder_dates(initiate_on: NaiveDate, close_on: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let span = (close_on - initiate_on).num_days();
    if span <= 1 || count == 0 {
        return Vec::new();
    }

    let mut dates = Vec::with_capacity(count as usize);
    for k in 1..=i64::from(count) {
        let offset = span * k / (i64::from(count) + 1);
        let date = initiate_on + Duration::days(offset);
        if date > initiate_on && date < close_on && dates.last() != Some(&date) {
            dates.push(date);
        }
    }
    dates
}

/// Plan initiate/remind/close for one period window.
pub fn plan_window(
    detail_id: Option<Uuid>,
    window_end: NaiveDate,
    timing: Timing,
) -> Vec<PlannedTask> {
    let initiate_on = window_end + Duration::days(timing.days_to_initiate);
    let close_on = initiate_on + Duration::days(timing.days_to_close);

    let mut tasks = vec![PlannedTask {
        frequency_calendar_detail_id: detail_id,
        kind: TaskKind::Initiate,
        scheduled_on: initiate_on,
    }];
    for date in reminder_dates(initiate_on, close_on, timing.number_of_reminders) {
        tasks.push(PlannedTask {
            frequency_calendar_detail_id: detail_id,
            kind: TaskKind::Remind,
            scheduled_on: date,
        });
    }
    tasks.push(PlannedTask {
        frequency_calendar_detail_id: detail_id,
        kind: TaskKind::Close,
        scheduled_on: close_on,
    });
    tasks
}

/// Full task plan for an appraisal at activation time.
///
/// Calendar-driven appraisals get one window plan per active calendar
/// detail. A publish-now appraisal (or one without a calendar) gets a single
/// synthetic window ending on the activation date, so initiation is due on
/// the next sweep.
pub fn plan_appraisal(
    appraisal: &InitiatedAppraisal,
    details: &[(FrequencyCalendarDetail, Option<DetailTiming>)],
    activated_on: NaiveDate,
) -> Vec<PlannedTask> {
    let calendar_driven = appraisal.publish_type == PublishType::AsPerCalendar
        && appraisal.frequency_calendar_id.is_some();

    if !calendar_driven {
        let timing = resolve_timing(appraisal, None);
        return plan_window(None, activated_on - Duration::days(timing.days_to_initiate), timing);
    }

    let mut tasks = Vec::new();
    for (detail, timing) in details {
        let timing = resolve_timing(appraisal, timing.as_ref());
        tasks.extend(plan_window(Some(detail.id), detail.end_date, timing));
    }
    tasks.sort_by(|a, b| a.scheduled_on.cmp(&b.scheduled_on));
    tasks
}

/// Joining on or before this date counts as at least a year of tenure.
pub fn tenure_cutoff(scheduled_on: NaiveDate) -> NaiveDate {
    scheduled_on
        .checked_sub_months(Months::new(12))
        .unwrap_or(scheduled_on)
}

/// Whether an employee takes part in an initiation run on `scheduled_on`.
/// Unknown joining dates are included; the exclusion list and the tenure
/// flag both remove people.
pub fn eligible_for_initiation(
    user: &User,
    appraisal: &InitiatedAppraisal,
    scheduled_on: NaiveDate,
) -> bool {
    if user.status != Status::Active {
        return false;
    }
    if appraisal.excluded_employee_ids.contains(&user.id) {
        return false;
    }
    if appraisal.exclude_tenure_under_year {
        if let Some(joined) = user.date_of_joining {
            if joined > tenure_cutoff(scheduled_on) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppraisalStatus, AppraisalType, UserRole};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn appraisal(publish_type: PublishType, calendar: Option<Uuid>) -> InitiatedAppraisal {
        InitiatedAppraisal {
            id: Uuid::new_v4(),
            appraisal_group_id: Uuid::new_v4(),
            appraisal_type: AppraisalType::QuestionnaireBased,
            questionnaire_template_ids: Vec::new(),
            document_url: None,
            frequency_calendar_id: calendar,
            days_to_initiate: 0,
            days_to_close: 30,
            number_of_reminders: 3,
            exclude_tenure_under_year: false,
            excluded_employee_ids: Vec::new(),
            status: AppraisalStatus::Draft,
            make_public: false,
            publish_type,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn detail(id: Uuid, end: NaiveDate) -> FrequencyCalendarDetail {
        FrequencyCalendarDetail {
            id,
            frequency_calendar_id: Uuid::new_v4(),
            display_name: "Q1".to_string(),
            start_date: end - Duration::days(89),
            end_date: end,
            status: Status::Active,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn employee(joined: Option<NaiveDate>) -> User {
        User {
            id: Uuid::new_v4(),
            email: Some("e@example.com".to_string()),
            first_name: Some("E".to_string()),
            last_name: None,
            code: None,
            designation: None,
            department: None,
            date_of_joining: joined,
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
    fn reminders_are_evenly_spaced_inside_the_window() {
        let initiate = date(2026, 4, 1);
        let close = date(2026, 5, 1);
        let dates = reminder_dates(initiate, close, 3);
        assert_eq!(
            dates,
            vec![date(2026, 4, 8), date(2026, 4, 16), date(2026, 4, 23)]
        );
    }

    #[test]
    fn narrow_spans_collapse_reminders() {
        let initiate = date(2026, 4, 1);
        assert_eq!(reminder_dates(initiate, initiate, 3), Vec::<NaiveDate>::new());
        assert_eq!(
            reminder_dates(initiate, initiate + Duration::days(1), 3),
            Vec::<NaiveDate>::new()
        );
        // Two days of span leave exactly one interior date.
        assert_eq!(
            reminder_dates(initiate, initiate + Duration::days(2), 5),
            vec![initiate + Duration::days(1)]
        );
    }

    #[test]
    fn window_plan_brackets_reminders_between_initiate_and_close() {
        let timing = Timing {
            days_to_initiate: 5,
            days_to_close: 20,
            number_of_reminders: 2,
        };
        let tasks = plan_window(None, date(2026, 3, 31), timing);

        assert_eq!(tasks.first().unwrap().kind, TaskKind::Initiate);
        assert_eq!(tasks.first().unwrap().scheduled_on, date(2026, 4, 5));
        assert_eq!(tasks.last().unwrap().kind, TaskKind::Close);
        assert_eq!(tasks.last().unwrap().scheduled_on, date(2026, 4, 25));

        let reminders: Vec<_> = tasks.iter().filter(|t| t.kind == TaskKind::Remind).collect();
        assert_eq!(reminders.len(), 2);
        for reminder in reminders {
            assert!(reminder.scheduled_on > date(2026, 4, 5));
            assert!(reminder.scheduled_on < date(2026, 4, 25));
        }
    }

    #[test]
    fn negative_days_to_close_is_clamped() {
        let timing = Timing::new(0, -10, 3);
        assert_eq!(timing.days_to_close, 0);
        let tasks = plan_window(None, date(2026, 3, 31), timing);
        // Initiation and close land on the same day, no reminders fit.
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].scheduled_on, tasks[1].scheduled_on);
    }

    #[test]
    fn publish_now_plans_a_single_immediate_window() {
        let appraisal = appraisal(PublishType::Now, None);
        let activated = date(2026, 8, 6);
        let tasks = plan_appraisal(&appraisal, &[], activated);

        assert_eq!(tasks[0].kind, TaskKind::Initiate);
        assert_eq!(tasks[0].scheduled_on, activated);
        assert!(tasks.iter().all(|t| t.frequency_calendar_detail_id.is_none()));
        assert_eq!(tasks.last().unwrap().kind, TaskKind::Close);
        assert_eq!(tasks.last().unwrap().scheduled_on, activated + Duration::days(30));
    }

    #[test]
    fn calendar_plan_covers_every_window_and_honors_overrides() {
        let calendar_id = Uuid::new_v4();
        let mut appraisal = appraisal(PublishType::AsPerCalendar, Some(calendar_id));
        appraisal.number_of_reminders = 0;

        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();
        let override_timing = DetailTiming {
            id: Uuid::new_v4(),
            initiated_appraisal_id: appraisal.id,
            frequency_calendar_detail_id: d2,
            days_to_initiate: 7,
            days_to_close: 10,
            number_of_reminders: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let details = vec![
            (detail(d1, date(2026, 3, 31)), None),
            (detail(d2, date(2026, 6, 30)), Some(override_timing)),
        ];

        let tasks = plan_appraisal(&appraisal, &details, date(2026, 1, 1));
        // Two windows, initiate + close each (no reminders).
        assert_eq!(tasks.len(), 4);

        let first_initiate = tasks
            .iter()
            .find(|t| t.kind == TaskKind::Initiate && t.frequency_calendar_detail_id == Some(d1))
            .unwrap();
        assert_eq!(first_initiate.scheduled_on, date(2026, 3, 31));

        let second_initiate = tasks
            .iter()
            .find(|t| t.kind == TaskKind::Initiate && t.frequency_calendar_detail_id == Some(d2))
            .unwrap();
        assert_eq!(second_initiate.scheduled_on, date(2026, 7, 7));

        let second_close = tasks
            .iter()
            .find(|t| t.kind == TaskKind::Close && t.frequency_calendar_detail_id == Some(d2))
            .unwrap();
        assert_eq!(second_close.scheduled_on, date(2026, 7, 17));

        // Sorted by date across windows.
        let dates: Vec<_> = tasks.iter().map(|t| t.scheduled_on).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn tenure_flag_excludes_recent_joiners() {
        let mut appraisal = appraisal(PublishType::Now, None);
        appraisal.exclude_tenure_under_year = true;
        let run_date = date(2026, 8, 6);

        let veteran = employee(Some(date(2024, 2, 1)));
        let newcomer = employee(Some(date(2026, 3, 1)));
        let boundary = employee(Some(date(2025, 8, 6)));
        let unknown = employee(None);

        assert!(eligible_for_initiation(&veteran, &appraisal, run_date));
        assert!(!eligible_for_initiation(&newcomer, &appraisal, run_date));
        assert!(eligible_for_initiation(&boundary, &appraisal, run_date));
        assert!(eligible_for_initiation(&unknown, &appraisal, run_date));
    }

    #[test]
    fn explicit_exclusions_and_inactive_status_always_win() {
        let mut appraisal = appraisal(PublishType::Now, None);
        let run_date = date(2026, 8, 6);

        let mut excluded = employee(Some(date(2020, 1, 1)));
        appraisal.excluded_employee_ids.push(excluded.id);
        assert!(!eligible_for_initiation(&excluded, &appraisal, run_date));

        excluded.id = Uuid::new_v4();
        excluded.status = Status::Inactive;
        assert!(!eligible_for_initiation(&excluded, &appraisal, run_date));
    }
}

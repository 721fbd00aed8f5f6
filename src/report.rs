use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Evaluation, EvaluationStatus, InitiatedAppraisal, User};

const STATUS_ORDER: [EvaluationStatus; 7] = [
    EvaluationStatus::Pending,
    EvaluationStatus::SelfSubmitted,
    EvaluationStatus::ManagerSubmitted,
    EvaluationStatus::MeetingScheduled,
    EvaluationStatus::MeetingCompleted,
    EvaluationStatus::Finalized,
    EvaluationStatus::Expired,
];

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: EvaluationStatus,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodCompletion {
    pub frequency_calendar_detail_id: Option<Uuid>,
    pub period: String,
    pub total: usize,
    pub finalized: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionSummary {
    pub initiated_appraisal_id: Uuid,
    pub total: usize,
    pub finalized: usize,
    pub expired: usize,
    /// Finalized share of evaluations still in play (expired rows are out
    /// of the denominator).
    pub completion_pct: f64,
    pub by_status: Vec<StatusCount>,
    pub periods: Vec<PeriodCompletion>,
}

pub fn summarize(
    appraisal_id: Uuid,
    evaluations: &[Evaluation],
    period_names: &HashMap<Uuid, String>,
) -> CompletionSummary {
    let mut by_status: Vec<StatusCount> = STATUS_ORDER
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: evaluations.iter().filter(|e| e.status == *status).count(),
        })
        .collect();
    by_status.retain(|entry| entry.count > 0);

    let finalized = evaluations
        .iter()
        .filter(|e| e.status == EvaluationStatus::Finalized)
        .count();
    let expired = evaluations
        .iter()
        .filter(|e| e.status == EvaluationStatus::Expired)
        .count();
    let in_play = evaluations.len() - expired;
    let completion_pct = if in_play == 0 {
        0.0
    } else {
        finalized as f64 * 100.0 / in_play as f64
    };

    let mut per_period: HashMap<Option<Uuid>, (usize, usize)> = HashMap::new();
    for evaluation in evaluations {
        let entry = per_period
            .entry(evaluation.frequency_calendar_detail_id)
            .or_insert((0, 0));
        entry.0 += 1;
        if evaluation.status == EvaluationStatus::Finalized {
            entry.1 += 1;
        }
    }
    let mut periods: Vec<PeriodCompletion> = per_period
        .into_iter()
        .map(|(detail_id, (total, finalized))| PeriodCompletion {
            frequency_calendar_detail_id: detail_id,
            period: detail_id
                .and_then(|id| period_names.get(&id).cloned())
                .unwrap_or_else(|| "immediate".to_string()),
            total,
            finalized,
        })
        .collect();
    periods.sort_by(|a, b| a.period.cmp(&b.period));

    CompletionSummary {
        initiated_appraisal_id: appraisal_id,
        total: evaluations.len(),
        finalized,
        expired,
        completion_pct,
        by_status,
        periods,
    }
}

pub fn build_report(
    appraisal: &InitiatedAppraisal,
    summary: &CompletionSummary,
    pending: &[User],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Appraisal Completion Report");
    let _ = writeln!(
        output,
        "Appraisal {} ({}, status {})",
        appraisal.id,
        appraisal.appraisal_type.as_str(),
        appraisal.status
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} of {} evaluations finalized ({:.1}% complete, {} expired)",
        summary.finalized, summary.total, summary.completion_pct, summary.expired
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## By Status");
    if summary.by_status.is_empty() {
        let _ = writeln!(output, "No evaluations created yet.");
    } else {
        for entry in &summary.by_status {
            let _ = writeln!(output, "- {}: {}", entry.status, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## By Period");
    if summary.periods.is_empty() {
        let _ = writeln!(output, "No periods initiated yet.");
    } else {
        for period in &summary.periods {
            let _ = writeln!(
                output,
                "- {}: {}/{} finalized",
                period.period, period.finalized, period.total
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Still Pending");
    if pending.is_empty() {
        let _ = writeln!(output, "Nobody, all self evaluations are in.");
    } else {
        for user in pending {
            let _ = writeln!(
                output,
                "- {} ({})",
                user.display_name(),
                user.email.as_deref().unwrap_or("no e-mail")
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppraisalStatus, AppraisalType, PublishType};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn evaluation(status: EvaluationStatus, detail: Option<Uuid>) -> Evaluation {
        Evaluation {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            manager_id: None,
            initiated_appraisal_id: Uuid::new_v4(),
            frequency_calendar_detail_id: detail,
            self_evaluation: None,
            self_submitted_at: None,
            manager_evaluation: None,
            manager_submitted_at: None,
            overall_rating: None,
            status,
            meeting_scheduled_at: None,
            meeting_notes: None,
            show_notes_to_employee: false,
            meeting_completed_at: None,
            finalized_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn completion_excludes_expired_from_denominator() {
        let appraisal_id = Uuid::new_v4();
        let evaluations = vec![
            evaluation(EvaluationStatus::Finalized, None),
            evaluation(EvaluationStatus::Pending, None),
            evaluation(EvaluationStatus::Expired, None),
            evaluation(EvaluationStatus::Expired, None),
        ];
        let summary = summarize(appraisal_id, &evaluations, &HashMap::new());

        assert_eq!(summary.total, 4);
        assert_eq!(summary.finalized, 1);
        assert_eq!(summary.expired, 2);
        assert!((summary.completion_pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_appraisal_reports_zero_percent() {
        let summary = summarize(Uuid::new_v4(), &[], &HashMap::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_pct, 0.0);
        assert!(summary.by_status.is_empty());
    }

    #[test]
    fn periods_are_named_and_sorted() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let mut names = HashMap::new();
        names.insert(q1, "Q1 2026".to_string());
        names.insert(q2, "Q2 2026".to_string());

        let evaluations = vec![
            evaluation(EvaluationStatus::Finalized, Some(q2)),
            evaluation(EvaluationStatus::Pending, Some(q1)),
            evaluation(EvaluationStatus::Finalized, Some(q1)),
        ];
        let summary = summarize(Uuid::new_v4(), &evaluations, &names);

        let labels: Vec<_> = summary.periods.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(labels, vec!["Q1 2026", "Q2 2026"]);
        assert_eq!(summary.periods[0].total, 2);
        assert_eq!(summary.periods[0].finalized, 1);
    }

    #[test]
    fn report_lists_pending_employees() {
        let appraisal = InitiatedAppraisal {
            id: Uuid::new_v4(),
            appraisal_group_id: Uuid::new_v4(),
            appraisal_type: AppraisalType::QuestionnaireBased,
            questionnaire_template_ids: Vec::new(),
            document_url: None,
            frequency_calendar_id: None,
            days_to_initiate: 0,
            days_to_close: 30,
            number_of_reminders: 3,
            exclude_tenure_under_year: false,
            excluded_employee_ids: Vec::new(),
            status: AppraisalStatus::Active,
            make_public: false,
            publish_type: PublishType::Now,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let summary = summarize(appraisal.id, &[], &HashMap::new());
        let report = build_report(&appraisal, &summary, &[]);

        assert!(report.contains("# Appraisal Completion Report"));
        assert!(report.contains("Nobody, all self evaluations are in."));
    }
}

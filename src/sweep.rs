use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::{InitiatedAppraisal, AppraisalStatus, ScheduledAppraisalTask, TaskKind, User};
use crate::notify::{render_template, send_mail, OutboundMail, SmtpSettings};
use crate::schedule;

const INVITATION_TEMPLATE_TYPE: &str = "appraisal_invitation";
const REMINDER_TEMPLATE_TYPE: &str = "appraisal_reminder";

const DEFAULT_INVITATION_SUBJECT: &str = "Your performance review has started";
const DEFAULT_INVITATION_BODY: &str = "Hello {{employee_name}},\n\n\
A {{appraisal_type}} appraisal has been initiated for you. Please sign in and \
complete your self evaluation.\n";
const DEFAULT_REMINDER_SUBJECT: &str = "Reminder: your self evaluation is due";
const DEFAULT_REMINDER_BODY: &str = "Hello {{employee_name}},\n\n\
Your self evaluation for the running {{appraisal_type}} appraisal has not been \
submitted yet. Please complete it soon.\n";

/// Counters from one polling pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepOutcome {
    pub executed: usize,
    pub failed: usize,
    pub evaluations_created: usize,
    pub reminders_sent: usize,
    pub evaluations_expired: u64,
    pub appraisals_closed: usize,
}

#[derive(Debug, Default)]
struct TaskEffect {
    evaluations_created: usize,
    reminders_sent: usize,
    evaluations_expired: u64,
    appraisal_closed: bool,
}

/// One polling pass over every due task. A task that fails is recorded on
/// its row and does not abort the rest of the sweep.
pub async fn run_sweep(
    pool: &PgPool,
    fallback_smtp: Option<&SmtpSettings>,
    as_of: NaiveDate,
) -> anyhow::Result<SweepOutcome> {
    let tasks = db::appraisals::due_tasks(pool, as_of).await?;
    info!(due = tasks.len(), %as_of, "sweep start");

    let mut outcome = SweepOutcome::default();
    for task in tasks {
        match execute_task(pool, fallback_smtp, &task).await {
            Ok(effect) => {
                db::appraisals::mark_task_completed(pool, task.id).await?;
                outcome.executed += 1;
                outcome.evaluations_created += effect.evaluations_created;
                outcome.reminders_sent += effect.reminders_sent;
                outcome.evaluations_expired += effect.evaluations_expired;
                if effect.appraisal_closed {
                    outcome.appraisals_closed += 1;
                }
            }
            Err(err) => {
                warn!(task_id = %task.id, kind = task.kind.as_str(), error = %err, "task failed");
                db::appraisals::mark_task_failed(pool, task.id, &err.to_string()).await?;
                outcome.failed += 1;
            }
        }
    }

    info!(
        executed = outcome.executed,
        failed = outcome.failed,
        evaluations_created = outcome.evaluations_created,
        reminders_sent = outcome.reminders_sent,
        "sweep done",
    );
    Ok(outcome)
}

async fn execute_task(
    pool: &PgPool,
    fallback_smtp: Option<&SmtpSettings>,
    task: &ScheduledAppraisalTask,
) -> anyhow::Result<TaskEffect> {
    let appraisal = db::appraisals::get_appraisal_unscoped(pool, task.initiated_appraisal_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("initiated appraisal {} is gone", task.initiated_appraisal_id))?;

    match task.kind {
        TaskKind::Initiate => execute_initiate(pool, fallback_smtp, &appraisal, task).await,
        TaskKind::Remind => execute_remind(pool, fallback_smtp, &appraisal, task).await,
        TaskKind::Close => execute_close(pool, &appraisal, task).await,
    }
}

async fn execute_initiate(
    pool: &PgPool,
    fallback_smtp: Option<&SmtpSettings>,
    appraisal: &InitiatedAppraisal,
    task: &ScheduledAppraisalTask,
) -> anyhow::Result<TaskEffect> {
    let members = db::groups::list_member_users(pool, appraisal.appraisal_group_id).await?;
    let company_id = db::appraisals::company_for_appraisal(pool, appraisal.id).await?;

    let mut effect = TaskEffect::default();
    for member in members {
        if !schedule::eligible_for_initiation(&member, appraisal, task.scheduled_on) {
            continue;
        }
        let created = db::evaluations::create_evaluation_if_absent(
            pool,
            member.id,
            member.reporting_manager_id,
            appraisal.id,
            task.frequency_calendar_detail_id,
        )
        .await?;
        if created.is_none() {
            continue;
        }
        effect.evaluations_created += 1;

        let delivered = notify_employee(
            pool,
            fallback_smtp,
            company_id,
            &member,
            appraisal,
            INVITATION_TEMPLATE_TYPE,
            DEFAULT_INVITATION_SUBJECT,
            DEFAULT_INVITATION_BODY,
        )
        .await;
        if let Err(err) = delivered {
            warn!(employee = %member.id, error = %err, "invitation mail failed");
        }
    }
    Ok(effect)
}

async fn execute_remind(
    pool: &PgPool,
    fallback_smtp: Option<&SmtpSettings>,
    appraisal: &InitiatedAppraisal,
    task: &ScheduledAppraisalTask,
) -> anyhow::Result<TaskEffect> {
    let unsubmitted = db::evaluations::unsubmitted_employees(
        pool,
        appraisal.id,
        task.frequency_calendar_detail_id,
    )
    .await?;
    let company_id = db::appraisals::company_for_appraisal(pool, appraisal.id).await?;

    let mut effect = TaskEffect::default();
    for employee in unsubmitted {
        match notify_employee(
            pool,
            fallback_smtp,
            company_id,
            &employee,
            appraisal,
            REMINDER_TEMPLATE_TYPE,
            DEFAULT_REMINDER_SUBJECT,
            DEFAULT_REMINDER_BODY,
        )
        .await
        {
            Ok(true) => effect.reminders_sent += 1,
            Ok(false) => {}
            Err(err) => warn!(employee = %employee.id, error = %err, "reminder mail failed"),
        }
    }
    Ok(effect)
}

async fn execute_close(
    pool: &PgPool,
    appraisal: &InitiatedAppraisal,
    task: &ScheduledAppraisalTask,
) -> anyhow::Result<TaskEffect> {
    let expired = db::evaluations::expire_unfinished(
        pool,
        appraisal.id,
        task.frequency_calendar_detail_id,
    )
    .await?;

    // This task is still pending at this point, so one remaining close task
    // means every other period is already shut.
    let pending_close = db::appraisals::count_pending_close_tasks(pool, appraisal.id).await?;
    let mut closed = false;
    if pending_close <= 1 {
        closed = db::appraisals::transition_appraisal(
            pool,
            appraisal.id,
            &[AppraisalStatus::Active],
            AppraisalStatus::Closed,
        )
        .await?;
    }

    Ok(TaskEffect {
        evaluations_expired: expired,
        appraisal_closed: closed,
        ..TaskEffect::default()
    })
}

/// One-off reminder for a single employee, requested from the API rather
/// than a scheduled task.
pub async fn send_manual_reminder(
    pool: &PgPool,
    fallback_smtp: Option<&SmtpSettings>,
    appraisal: &InitiatedAppraisal,
    employee: &User,
) -> anyhow::Result<bool> {
    let company_id = db::appraisals::company_for_appraisal(pool, appraisal.id).await?;
    notify_employee(
        pool,
        fallback_smtp,
        company_id,
        employee,
        appraisal,
        REMINDER_TEMPLATE_TYPE,
        DEFAULT_REMINDER_SUBJECT,
        DEFAULT_REMINDER_BODY,
    )
    .await
}

/// Send one templated notification. Returns `Ok(false)` when the employee
/// has no address or no SMTP path is configured.
pub(crate) async fn notify_employee(
    pool: &PgPool,
    fallback_smtp: Option<&SmtpSettings>,
    company_id: Option<Uuid>,
    employee: &User,
    appraisal: &InitiatedAppraisal,
    template_type: &str,
    default_subject: &str,
    default_body: &str,
) -> anyhow::Result<bool> {
    let Some(to_email) = employee.email.clone() else {
        return Ok(false);
    };
    let Some(settings) = smtp_for_company(pool, fallback_smtp, company_id).await? else {
        warn!(company_id = ?company_id, "no SMTP configuration, skipping notification");
        return Ok(false);
    };

    let template = db::notify::email_template_by_type(pool, template_type).await?;
    let (subject, body) = match &template {
        Some(t) => (t.subject.as_str(), t.body.as_str()),
        None => (default_subject, default_body),
    };

    let employee_name = employee.display_name();
    let substitutions = [
        ("employee_name", employee_name.as_str()),
        ("appraisal_type", appraisal.appraisal_type.as_str()),
    ];
    let mail = OutboundMail {
        to_email,
        to_name: employee_name.clone(),
        subject: render_template(subject, &substitutions),
        body: render_template(body, &substitutions),
        ics_attachment: None,
    };
    send_mail(&settings, &mail).await?;
    Ok(true)
}

pub(crate) async fn smtp_for_company(
    pool: &PgPool,
    fallback: Option<&SmtpSettings>,
    company_id: Option<Uuid>,
) -> sqlx::Result<Option<SmtpSettings>> {
    if let Some(config) = db::notify::active_email_config(pool, company_id).await? {
        return Ok(Some(SmtpSettings::from(&config)));
    }
    Ok(fallback.cloned())
}

/// Background polling loop for `serve`: one sweep per interval tick.
pub async fn run_periodic(pool: PgPool, fallback_smtp: Option<SmtpSettings>, interval_secs: u64) {
    let period = std::time::Duration::from_secs(interval_secs.max(60));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let today = Utc::now().date_naive();
        if let Err(err) = run_sweep(&pool, fallback_smtp.as_ref(), today).await {
            error!(error = %err, "periodic sweep failed");
        }
    }
}

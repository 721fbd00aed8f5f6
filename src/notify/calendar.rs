use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{CalendarCredential, CalendarProviderKind};

use super::NotifyError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_EVENTS_URL: &str =
    "https://www.googleapis.com/calendar/v3/calendars/primary/events?sendUpdates=all";
const OUTLOOK_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
const OUTLOOK_EVENTS_URL: &str = "https://graph.microsoft.com/v1.0/me/calendar/events";
const OUTLOOK_REFRESH_SCOPE: &str = "https://graph.microsoft.com/Calendars.ReadWrite offline_access";

/// Tokens within this window of expiry are refreshed before use.
const EXPIRY_BUFFER_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub struct MeetingEvent {
    pub subject: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    /// (email, display name) pairs.
    pub attendees: Vec<(String, String)>,
}

impl MeetingEvent {
    /// The payload for a one-on-one performance review meeting.
    pub fn review_meeting(
        employee_name: &str,
        employee_email: &str,
        manager_name: &str,
        manager_email: &str,
        start: DateTime<Utc>,
        duration_minutes: i64,
        location: Option<String>,
        notes: Option<&str>,
    ) -> Self {
        let mut description =
            format!("One-on-one performance review meeting between {employee_name} and {manager_name}");
        if let Some(notes) = notes {
            description.push_str("\n\nNotes: ");
            description.push_str(notes);
        }
        MeetingEvent {
            subject: format!("Performance Review Meeting - {employee_name} ({duration_minutes}min)"),
            description,
            start,
            end: start + Duration::minutes(duration_minutes),
            location,
            attendees: vec![
                (employee_email.to_string(), employee_name.to_string()),
                (manager_email.to_string(), manager_name.to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Created {
        provider: CalendarProviderKind,
        event_id: Option<String>,
    },
    /// No usable provider credential; the caller mails an ICS attachment.
    IcsFallback,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: Option<String>,
}

/// Whether a stored access token can be used without a refresh round-trip.
fn token_is_fresh(
    access_token: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (access_token, expires_at) {
        (None, _) => false,
        // No recorded expiry: optimistically use it; a 401 falls back below.
        (Some(_), None) => true,
        (Some(_), Some(expiry)) => expiry > now + Duration::seconds(EXPIRY_BUFFER_SECS),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalendarClient {
    http: reqwest::Client,
}

impl CalendarClient {
    pub fn new() -> Self {
        CalendarClient {
            http: reqwest::Client::new(),
        }
    }

    /// Create a meeting event with the company's first usable provider,
    /// Google before Outlook; [`EventOutcome::IcsFallback`] when neither has
    /// an active credential that yields a token.
    pub async fn create_meeting(
        &self,
        pool: &PgPool,
        company_id: Uuid,
        event: &MeetingEvent,
    ) -> Result<EventOutcome, NotifyError> {
        for provider in [CalendarProviderKind::Google, CalendarProviderKind::Outlook] {
            let Some(credential) = db::notify::get_credential(pool, company_id, provider).await?
            else {
                continue;
            };
            match self.ensure_fresh_token(pool, &credential).await {
                Ok(token) => {
                    let event_id = match provider {
                        CalendarProviderKind::Google => self.create_google_event(&token, event).await?,
                        CalendarProviderKind::Outlook => {
                            self.create_outlook_event(&token, event).await?
                        }
                    };
                    return Ok(EventOutcome::Created { provider, event_id });
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.as_str(),
                        company_id = %company_id,
                        error = %err,
                        "calendar credential unusable, trying next provider",
                    );
                }
            }
        }
        Ok(EventOutcome::IcsFallback)
    }

    /// Return a usable access token, refreshing and persisting it when the
    /// stored one is missing or near expiry.
    async fn ensure_fresh_token(
        &self,
        pool: &PgPool,
        credential: &CalendarCredential,
    ) -> Result<String, NotifyError> {
        if token_is_fresh(
            credential.access_token.as_deref(),
            credential.expires_at,
            Utc::now(),
        ) {
            if let Some(token) = &credential.access_token {
                return Ok(token.clone());
            }
        }

        let refreshed = match credential.provider {
            CalendarProviderKind::Google => self.refresh_google(credential).await?,
            CalendarProviderKind::Outlook => self.refresh_outlook(credential).await?,
        };
        let expires_at = refreshed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        db::notify::update_credential_tokens(
            pool,
            credential.company_id,
            credential.provider,
            &refreshed.access_token,
            refreshed.refresh_token.as_deref(),
            expires_at,
        )
        .await?;

        Ok(refreshed.access_token)
    }

    async fn refresh_google(
        &self,
        credential: &CalendarCredential,
    ) -> Result<TokenResponse, NotifyError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
                ("refresh_token", credential.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Provider(format!(
                "google token refresh returned {}",
                response.status()
            )));
        }
        let mut token: TokenResponse = response.json().await?;
        // Google does not rotate refresh tokens; never overwrite the stored one.
        token.refresh_token = None;
        Ok(token)
    }

    async fn refresh_outlook(
        &self,
        credential: &CalendarCredential,
    ) -> Result<TokenResponse, NotifyError> {
        let response = self
            .http
            .post(OUTLOOK_TOKEN_URL)
            .form(&[
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
                ("refresh_token", credential.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
                ("scope", OUTLOOK_REFRESH_SCOPE),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Provider(format!(
                "outlook token refresh returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn create_google_event(
        &self,
        access_token: &str,
        event: &MeetingEvent,
    ) -> Result<Option<String>, NotifyError> {
        let payload = json!({
            "summary": event.subject,
            "description": event.description,
            "start": { "dateTime": event.start.to_rfc3339(), "timeZone": "UTC" },
            "end": { "dateTime": event.end.to_rfc3339(), "timeZone": "UTC" },
            "location": event.location,
            "attendees": event
                .attendees
                .iter()
                .map(|(email, name)| json!({ "email": email, "displayName": name }))
                .collect::<Vec<_>>(),
        });

        let response = self
            .http
            .post(GOOGLE_EVENTS_URL)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Provider(format!(
                "google event creation returned {}",
                response.status()
            )));
        }
        let created: CreatedEvent = response.json().await?;
        Ok(created.id)
    }

    async fn create_outlook_event(
        &self,
        access_token: &str,
        event: &MeetingEvent,
    ) -> Result<Option<String>, NotifyError> {
        let payload = json!({
            "subject": event.subject,
            "body": { "contentType": "HTML", "content": event.description },
            "start": { "dateTime": event.start.to_rfc3339(), "timeZone": "UTC" },
            "end": { "dateTime": event.end.to_rfc3339(), "timeZone": "UTC" },
            "location": { "displayName": event.location.clone().unwrap_or_default() },
            "attendees": event
                .attendees
                .iter()
                .map(|(email, name)| json!({
                    "emailAddress": { "address": email, "name": name },
                    "type": "required",
                }))
                .collect::<Vec<_>>(),
        });

        let response = self
            .http
            .post(OUTLOOK_EVENTS_URL)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Provider(format!(
                "outlook event creation returned {}",
                response.status()
            )));
        }
        let created: CreatedEvent = response.json().await?;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_freshness_respects_the_expiry_buffer() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();

        assert!(!token_is_fresh(None, None, now));
        assert!(token_is_fresh(Some("tok"), None, now));
        assert!(token_is_fresh(
            Some("tok"),
            Some(now + Duration::seconds(120)),
            now
        ));
        // Inside the buffer counts as stale.
        assert!(!token_is_fresh(
            Some("tok"),
            Some(now + Duration::seconds(30)),
            now
        ));
        assert!(!token_is_fresh(Some("tok"), Some(now - Duration::hours(1)), now));
    }

    #[test]
    fn review_meeting_builds_subject_and_attendees() {
        let start = Utc.with_ymd_and_hms(2026, 8, 10, 14, 0, 0).unwrap();
        let event = MeetingEvent::review_meeting(
            "Avery Lee",
            "avery@example.com",
            "Jordan Kim",
            "jordan@example.com",
            start,
            45,
            None,
            Some("focus on growth areas"),
        );

        assert_eq!(event.subject, "Performance Review Meeting - Avery Lee (45min)");
        assert_eq!(event.end, start + Duration::minutes(45));
        assert_eq!(event.attendees.len(), 2);
        assert!(event.description.contains("Notes: focus on growth areas"));
    }
}

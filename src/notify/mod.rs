use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::models::EmailConfig;

pub mod calendar;
pub mod ics;

pub use calendar::{CalendarClient, EventOutcome, MeetingEvent};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no SMTP configuration available")]
    NoSmtpConfig,
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("mail build failed: {0}")]
    Mail(#[from] lettre::error::Error),
    #[error("mail content type rejected: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),
    #[error("smtp send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("calendar provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("calendar provider rejected the request: {0}")]
    Provider(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// SMTP connection settings, either a tenant's `EmailConfig` row or the
/// process-level fallback from the environment.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl From<&EmailConfig> for SmtpSettings {
    fn from(config: &EmailConfig) -> Self {
        SmtpSettings {
            host: config.smtp_host.clone(),
            port: config.smtp_port.clamp(1, i32::from(u16::MAX)) as u16,
            username: config.smtp_username.clone(),
            password: config.smtp_password.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
    /// RFC 5545 calendar payload attached as `invite.ics` when present.
    pub ics_attachment: Option<String>,
}

pub async fn send_mail(settings: &SmtpSettings, mail: &OutboundMail) -> Result<(), NotifyError> {
    let from = Mailbox::new(Some(settings.from_name.clone()), settings.from_email.parse()?);
    let to = Mailbox::new(Some(mail.to_name.clone()), mail.to_email.parse()?);

    let builder = Message::builder().from(from).to(to).subject(&mail.subject);
    let message = match &mail.ics_attachment {
        Some(ics) => {
            let calendar_part = Attachment::new("invite.ics".to_string())
                .body(ics.clone(), ContentType::parse("text/calendar; method=REQUEST")?);
            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(mail.body.clone()))
                    .singlepart(calendar_part),
            )?
        }
        None => builder.body(mail.body.clone())?,
    };

    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        .port(settings.port)
        .credentials(Credentials::new(
            settings.username.clone(),
            settings.password.clone(),
        ))
        .build();
    transport.send(message).await?;
    Ok(())
}

/// `{{placeholder}}` substitution for e-mail templates. Unknown placeholders
/// are left as-is so a template typo is visible in the delivered mail rather
/// than silently blanked.
pub fn render_template(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in substitutions {
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn template_substitution_replaces_all_occurrences() {
        let rendered = render_template(
            "Hello {{name}}, your {{kind}} review awaits, {{name}}.",
            &[("name", "Avery"), ("kind", "quarterly")],
        );
        assert_eq!(rendered, "Hello Avery, your quarterly review awaits, Avery.");
    }

    #[test]
    fn unknown_placeholders_survive() {
        let rendered = render_template("Hi {{name}}, due {{deadline}}", &[("name", "Avery")]);
        assert_eq!(rendered, "Hi Avery, due {{deadline}}");
    }
}

use chrono::{DateTime, Utc};

use super::calendar::MeetingEvent;

/// RFC 5545 timestamp in UTC.
fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape text per RFC 5545 section 3.3.11.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Render a single-event VCALENDAR suitable as a mail attachment. This is
/// the fallback path when no provider credential is configured for the
/// company.
pub fn meeting_invite(event: &MeetingEvent, uid: &str, stamped_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//perfcycle//EN".to_string(),
        "METHOD:REQUEST".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{uid}"),
        format!("DTSTAMP:{}", format_utc(stamped_at)),
        format!("DTSTART:{}", format_utc(event.start)),
        format!("DTEND:{}", format_utc(event.end)),
        format!("SUMMARY:{}", escape_text(&event.subject)),
        format!("DESCRIPTION:{}", escape_text(&event.description)),
    ];
    if let Some(location) = &event.location {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    for (email, name) in &event.attendees {
        lines.push(format!(
            "ATTENDEE;CN={};RSVP=TRUE:mailto:{}",
            escape_text(name),
            email
        ));
    }
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());
    // RFC 5545 requires CRLF line endings.
    lines.join("\r\n") + "\r\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn event() -> MeetingEvent {
        MeetingEvent {
            subject: "Performance Review; Avery Lee".to_string(),
            description: "One-on-one review\nBring notes, please".to_string(),
            start: Utc.with_ymd_and_hms(2026, 8, 10, 14, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 8, 10, 15, 0, 0).unwrap(),
            location: Some("Room 4, HQ".to_string()),
            attendees: vec![
                ("avery@example.com".to_string(), "Avery Lee".to_string()),
                ("jordan@example.com".to_string(), "Jordan Kim".to_string()),
            ],
        }
    }

    #[test]
    fn invite_contains_escaped_fields_and_both_attendees() {
        let stamp = Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap();
        let ics = meeting_invite(&event(), "eval-123@perfcycle", stamp);

        assert!(ics.contains("SUMMARY:Performance Review\\; Avery Lee"));
        assert!(ics.contains("DESCRIPTION:One-on-one review\\nBring notes\\, please"));
        assert!(ics.contains("LOCATION:Room 4\\, HQ"));
        assert!(ics.contains("DTSTART:20260810T140000Z"));
        assert!(ics.contains("DTEND:20260810T150000Z"));
        assert!(ics.contains("ATTENDEE;CN=Avery Lee;RSVP=TRUE:mailto:avery@example.com"));
        assert!(ics.contains("ATTENDEE;CN=Jordan Kim;RSVP=TRUE:mailto:jordan@example.com"));
    }

    #[test]
    fn invite_uses_crlf_and_wraps_in_vcalendar() {
        let stamp = Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap();
        let ics = meeting_invite(&event(), "uid", stamp);
        let lines: Vec<&str> = ics.split("\r\n").collect();
        assert_eq!(lines.first(), Some(&"BEGIN:VCALENDAR"));
        assert_eq!(lines[lines.len() - 2], "END:VCALENDAR");
        assert_eq!(lines.last(), Some(&""));
        assert!(!ics.contains("\n\n"));
    }
}

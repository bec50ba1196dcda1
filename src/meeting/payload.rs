//! Wire shape of the Graph `event` resource sent on creation.

use super::validate::{ValidMeeting, ValidationError};
use chrono::{Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;

pub const ONLINE_MEETING_PROVIDER: &str = "teamsForBusiness";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPayload {
    pub subject: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub is_online_meeting: bool,
    pub online_meeting_provider: &'static str,
    pub attendees: Vec<EventAttendee>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub email_address: EmailAddress,
    #[serde(rename = "type")]
    pub kind: AttendeeKind,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailAddress {
    pub address: String,
}

// Every invitee is required; organizer and optional attendees are never sent
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeKind {
    Required,
}

/// Builds the event body, converting wall-clock times in `tz` to UTC.
pub fn build_payload<Tz: TimeZone>(
    meeting: &ValidMeeting,
    tz: &Tz,
) -> Result<MeetingPayload, ValidationError> {
    Ok(MeetingPayload {
        subject: meeting.subject.clone(),
        start: utc_event_time(&meeting.start, tz, "Start")?,
        end: utc_event_time(&meeting.end, tz, "End")?,
        is_online_meeting: true,
        online_meeting_provider: ONLINE_MEETING_PROVIDER,
        attendees: meeting
            .attendees
            .iter()
            .map(|attendee| EventAttendee {
                email_address: EmailAddress {
                    address: attendee.email.clone(),
                },
                kind: AttendeeKind::Required,
            })
            .collect(),
    })
}

fn utc_event_time<Tz: TimeZone>(
    local: &NaiveDateTime,
    tz: &Tz,
    which: &'static str,
) -> Result<EventDateTime, ValidationError> {
    // Ambiguous wall-clock times (DST fall-back) take the earlier instant;
    // times skipped by spring-forward move ahead by the skipped hour
    let instant = tz
        .from_local_datetime(local)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(*local + Duration::hours(1)))
                .earliest()
        })
        .ok_or(ValidationError::NonexistentLocalTime { which })?;

    Ok(EventDateTime {
        date_time: instant
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        time_zone: "UTC",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::validate::validate;
    use crate::meeting::MeetingRequest;
    use chrono::FixedOffset;
    use chrono_tz::Europe::Berlin;
    use serde_json::json;

    fn sync_meeting() -> ValidMeeting {
        validate(&MeetingRequest {
            subject: "Sync".to_string(),
            start_date_time: "2024-01-01T10:00".to_string(),
            end_date_time: "2024-01-01T11:00".to_string(),
            attendees: "a@b.com,c@d.com".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn builds_graph_event_body() {
        let payload = build_payload(&sync_meeting(), &Utc).unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body,
            json!({
                "subject": "Sync",
                "start": { "dateTime": "2024-01-01T10:00:00.000Z", "timeZone": "UTC" },
                "end": { "dateTime": "2024-01-01T11:00:00.000Z", "timeZone": "UTC" },
                "isOnlineMeeting": true,
                "onlineMeetingProvider": "teamsForBusiness",
                "attendees": [
                    { "emailAddress": { "address": "a@b.com" }, "type": "required" },
                    { "emailAddress": { "address": "c@d.com" }, "type": "required" }
                ]
            })
        );
    }

    #[test]
    fn local_times_are_shifted_to_utc() {
        let berlin_winter = FixedOffset::east_opt(3600).unwrap();
        let payload = build_payload(&sync_meeting(), &berlin_winter).unwrap();
        assert_eq!(payload.start.date_time, "2024-01-01T09:00:00.000Z");
        assert_eq!(payload.end.date_time, "2024-01-01T10:00:00.000Z");

        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let payload = build_payload(&sync_meeting(), &new_york).unwrap();
        assert_eq!(payload.start.date_time, "2024-01-01T15:00:00.000Z");
    }

    fn berlin_meeting(start: &str, end: &str) -> ValidMeeting {
        validate(&MeetingRequest {
            subject: "Sync".to_string(),
            start_date_time: start.to_string(),
            end_date_time: end.to_string(),
            attendees: "a@b.com".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn skipped_local_time_moves_forward() {
        // 02:00-03:00 does not exist in Berlin on 2024-03-31
        let meeting = berlin_meeting("2024-03-31T02:30", "2024-03-31T04:00");
        let payload = build_payload(&meeting, &Berlin).unwrap();
        assert_eq!(payload.start.date_time, "2024-03-31T01:30:00.000Z");
        assert_eq!(payload.end.date_time, "2024-03-31T02:00:00.000Z");
    }

    #[test]
    fn repeated_local_time_takes_earlier_instant() {
        // 02:00-03:00 happens twice in Berlin on 2024-10-27, first in CEST
        let meeting = berlin_meeting("2024-10-27T02:30", "2024-10-27T04:00");
        let payload = build_payload(&meeting, &Berlin).unwrap();
        assert_eq!(payload.start.date_time, "2024-10-27T00:30:00.000Z");
        assert_eq!(payload.end.date_time, "2024-10-27T03:00:00.000Z");
    }
}

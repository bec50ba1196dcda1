use super::{MeetingRequest, GENERIC_FAILURE};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

// Formats produced by a datetime-local style input, with and without seconds
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingField,

    #[error("{which} time is not a valid date and time.")]
    InvalidDateTime { which: &'static str },

    #[error("End time must be after start time.")]
    EndBeforeStart,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("{which} time does not exist in the local time zone.")]
    NonexistentLocalTime { which: &'static str },
}

impl ValidationError {
    /// Attendee problems fail the submission as a whole, so the form shows
    /// the generic message; the rest point at the field to fix.
    pub fn is_submission_failure(&self) -> bool {
        matches!(self, ValidationError::InvalidEmail(_))
    }

    pub fn user_message(&self) -> String {
        if self.is_submission_failure() {
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// One entry of the attendee list after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub email: String,
}

/// A request that passed every check, still in local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMeeting {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub attendees: Vec<Attendee>,
}

/// Runs the checks in order and stops at the first failure.
pub fn validate(request: &MeetingRequest) -> Result<ValidMeeting, ValidationError> {
    if request.subject.is_empty()
        || request.start_date_time.is_empty()
        || request.end_date_time.is_empty()
        || request.attendees.is_empty()
    {
        return Err(ValidationError::MissingField);
    }

    let start = parse_local(&request.start_date_time, "Start")?;
    let end = parse_local(&request.end_date_time, "End")?;
    if start >= end {
        return Err(ValidationError::EndBeforeStart);
    }

    Ok(ValidMeeting {
        subject: request.subject.clone(),
        start,
        end,
        attendees: parse_attendees(&request.attendees)?,
    })
}

/// Splits the comma-separated list; the first malformed address aborts.
pub fn parse_attendees(raw: &str) -> Result<Vec<Attendee>, ValidationError> {
    raw.split(',')
        .map(|email| {
            let email = email.trim();
            if is_valid_email(email) {
                Ok(Attendee {
                    email: email.to_string(),
                })
            } else {
                Err(ValidationError::InvalidEmail(email.to_string()))
            }
        })
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_SHAPE: OnceLock<Regex> = OnceLock::new();
    EMAIL_SHAPE
        .get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"))
        .is_match(email)
}

fn parse_local(value: &str, which: &'static str) -> Result<NaiveDateTime, ValidationError> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .ok_or(ValidationError::InvalidDateTime { which })
}

// src/meeting/mod.rs
pub mod payload;
pub mod validate;

use crate::graph::CreatedEvent;
use crate::scheduler::ScheduleError;
use log::{error, info};
use validate::{validate, ValidMeeting};

pub const SUCCESS_MESSAGE: &str = "Meeting has been scheduled successfully!";
pub const GENERIC_FAILURE: &str =
    "Failed to schedule the meeting. Please ensure all fields are correct and try again.";

/// The four values typed into the form, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingRequest {
    pub subject: String,
    pub start_date_time: String,
    pub end_date_time: String,
    pub attendees: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Subject,
    StartDateTime,
    EndDateTime,
    Attendees,
}

impl MeetingRequest {
    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Subject => &mut self.subject,
            Field::StartDateTime => &mut self.start_date_time,
            Field::EndDateTime => &mut self.end_date_time,
            Field::Attendees => &mut self.attendees,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.field_mut(field) = value.into();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub is_loading: bool,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    /// Waiting for the user to dismiss the confirmation.
    Success(CreatedEvent),
    Failed,
}

/// Form state plus the submission state machine driving it.
#[derive(Debug, Default)]
pub struct MeetingForm {
    pub request: MeetingRequest,
    pub submission: SubmissionState,
    pub phase: Phase,
}

impl MeetingForm {
    pub fn can_submit(&self) -> bool {
        !self.submission.is_loading && !matches!(self.phase, Phase::Submitting)
    }

    /// Validates the current input and, on success, enters `Submitting`.
    ///
    /// Returns `None` when a submission is already running or when the
    /// input is rejected; in the latter case `submission.error` holds the
    /// message to show and nothing is sent. A bad attendee address fails
    /// the submission outright with the generic message.
    pub fn begin_submit(&mut self) -> Option<ValidMeeting> {
        if !self.can_submit() {
            return None;
        }
        self.submission.error.clear();

        match validate(&self.request) {
            Ok(meeting) => {
                self.submission.is_loading = true;
                self.phase = Phase::Submitting;
                Some(meeting)
            }
            Err(e) => {
                if e.is_submission_failure() {
                    error!("Error scheduling meeting: {}", e);
                    self.phase = Phase::Failed;
                }
                self.submission.error = e.user_message();
                None
            }
        }
    }

    /// Applies the pipeline result. Loading is cleared on every path.
    pub fn finish(&mut self, outcome: Result<CreatedEvent, ScheduleError>) {
        self.submission.is_loading = false;
        match outcome {
            Ok(event) => {
                info!("Meeting scheduled successfully: {:?}", event.id);
                self.request.clear();
                self.phase = Phase::Success(event);
            }
            Err(e) => {
                error!("Error scheduling meeting: {}", e);
                self.submission.error = e.user_message();
                self.phase = Phase::Failed;
            }
        }
    }

    /// Dismisses the success confirmation.
    pub fn acknowledge(&mut self) {
        if matches!(self.phase, Phase::Success(_)) {
            self.phase = Phase::Idle;
        }
    }
}

// src/scheduler.rs
//
// validate -> authenticate -> build payload -> submit. The form owns the
// outcome; this module only produces it.

use crate::auth::{acquire_token, AuthError, TokenProvider};
use crate::config::AppConfig;
use crate::graph::{CreatedEvent, GraphClient, SubmitError};
use crate::meeting::payload::build_payload;
use crate::meeting::validate::{validate, ValidMeeting, ValidationError};
use crate::meeting::MeetingRequest;
use chrono::Local;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

pub use crate::meeting::GENERIC_FAILURE;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Token acquisition failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Calendar request failed: {0}")]
    Transport(#[from] SubmitError),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("Scheduling task ended unexpectedly: {0}")]
    TaskFailed(String),
}

impl ScheduleError {
    /// What the form shows. Field problems are specific; everything else
    /// collapses into one message and the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            ScheduleError::Validation(e) => e.user_message(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

pub struct Scheduler<P> {
    provider: P,
    graph: GraphClient,
    scopes: Vec<String>,
    token_timeout: Duration,
    submit_timeout: Duration,
    in_flight: AtomicBool,
}

// Clears the in-flight flag however the pipeline exits
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P: TokenProvider> Scheduler<P> {
    pub fn new(
        provider: P,
        graph: GraphClient,
        scopes: Vec<String>,
        token_timeout: Duration,
        submit_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            graph,
            scopes,
            token_timeout,
            submit_timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn from_config(provider: P, config: &AppConfig) -> Result<Self, SubmitError> {
        Ok(Self::new(
            provider,
            GraphClient::new(&config.graph.events_url())?,
            config.identity.scopes.clone(),
            config.identity.timeout(),
            config.graph.timeout(),
        ))
    }

    /// Full pipeline starting from raw form input.
    pub async fn schedule(&self, request: &MeetingRequest) -> Result<CreatedEvent, ScheduleError> {
        let meeting = validate(request)?;
        self.submit(&meeting).await
    }

    /// Sends an already validated meeting. At most one call runs at a time;
    /// an overlapping call fails without touching the network.
    pub async fn submit(&self, meeting: &ValidMeeting) -> Result<CreatedEvent, ScheduleError> {
        let payload = build_payload(meeting, &Local)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScheduleError::AlreadySubmitting);
        }
        let _guard = InFlight(&self.in_flight);

        let token = timeout(self.token_timeout, acquire_token(&self.provider, &self.scopes))
            .await
            .map_err(|_| ScheduleError::Timeout {
                stage: "Token acquisition",
                after: self.token_timeout,
            })??;

        info!(
            "Scheduling '{}' with {} attendees",
            payload.subject,
            payload.attendees.len()
        );
        let event = timeout(self.submit_timeout, self.graph.create_event(&payload, &token))
            .await
            .map_err(|_| ScheduleError::Timeout {
                stage: "Calendar request",
                after: self.submit_timeout,
            })??;

        Ok(event)
    }

    /// Runs `submit` on its own task so that a panic anywhere in the
    /// pipeline still yields an outcome for the form.
    pub async fn submit_in_task(
        self: Arc<Self>,
        meeting: ValidMeeting,
    ) -> Result<CreatedEvent, ScheduleError>
    where
        P: 'static,
    {
        tokio::spawn(async move { self.submit(&meeting).await })
            .await
            .unwrap_or_else(|e| Err(ScheduleError::TaskFailed(e.to_string())))
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

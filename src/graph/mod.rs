// src/graph/mod.rs
use crate::meeting::payload::MeetingPayload;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub type TokioConnector = hyper_rustls::HttpsConnector<HttpConnector>;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Invalid events endpoint '{url}': {source}")]
    Endpoint {
        url: String,
        source: hyper::http::uri::InvalidUri,
    },

    #[error("Failed to set up TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to build request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("Request failed: {0}")]
    Network(#[from] hyper_util::client::legacy::Error),

    #[error("Failed to read response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("Calendar API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// The parts of the created event the app shows back to the user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub web_link: Option<String>,
    #[serde(default)]
    pub online_meeting: Option<OnlineMeetingInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMeetingInfo {
    #[serde(default)]
    pub join_url: Option<String>,
}

impl CreatedEvent {
    pub fn join_url(&self) -> Option<&str> {
        self.online_meeting
            .as_ref()
            .and_then(|m| m.join_url.as_deref())
    }
}

/// HTTPS connector trusting the Mozilla root set; plain http stays allowed
/// for local endpoints.
pub fn https_connector() -> Result<TokioConnector, rustls::Error> {
    Ok(hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .build())
}

/// Posts events to `/me/events`. One attempt per call, no retries.
pub struct GraphClient {
    http: Client<TokioConnector, Full<Bytes>>,
    events_uri: Uri,
}

impl GraphClient {
    pub fn new(events_url: &str) -> Result<Self, SubmitError> {
        let events_uri = events_url
            .parse::<Uri>()
            .map_err(|source| SubmitError::Endpoint {
                url: events_url.to_string(),
                source,
            })?;
        let http = Client::builder(TokioExecutor::new())
            .build(https_connector()?);
        Ok(Self { http, events_uri })
    }

    pub async fn create_event(
        &self,
        payload: &MeetingPayload,
        token: &SecretString,
    ) -> Result<CreatedEvent, SubmitError> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.events_uri.clone())
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))?;

        debug!("POST {} ({} attendees)", self.events_uri, payload.attendees.len());
        let response = self.http.request(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            return Err(SubmitError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let event: CreatedEvent = serde_json::from_slice(&bytes)?;
        info!("Calendar API created event {:?}", event.id);
        Ok(event)
    }
}

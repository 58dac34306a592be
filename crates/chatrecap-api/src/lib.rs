// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use chatrecap_app::{AnalysisPayload, Failure, Year};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("cannot reach {base_url} -- is the analysis service running? ({source})")]
    Connection {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl From<ServiceError> for Failure {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Decode { .. } => Self::ResponseShape(error.to_string()),
            ServiceError::InvalidUrl { .. }
            | ServiceError::Build(_)
            | ServiceError::Connection { .. }
            | ServiceError::Status { .. }
            | ServiceError::Body(_) => Self::Network(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    /// `timeout: None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        validate_base_url(&base_url)?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::Build)?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn available_years(&self, transcript: &str) -> Result<Vec<Year>, ServiceError> {
        info!(bytes = transcript.len(), "requesting available years");
        let response = self.post("available-years", &YearsRequest { transcript })?;
        let body = read_success_body(response)?;
        let parsed: YearsResponse = serde_json::from_str(&body).map_err(|error| {
            ServiceError::Decode {
                what: "available years",
                reason: error.to_string(),
            }
        })?;
        debug!(years = parsed.available_years.len(), "available years decoded");
        Ok(parsed.available_years)
    }

    pub fn analyze(&self, transcript: &str, year: &Year) -> Result<AnalysisPayload, ServiceError> {
        info!(year = %year, "requesting analysis");
        let response = self.post("analyze", &AnalyzeRequest { transcript, year })?;
        let body = read_success_body(response)?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|error| ServiceError::Decode {
                what: "analysis",
                reason: error.to_string(),
            })?;
        let payload = AnalysisPayload::from_value(value).ok_or(ServiceError::Decode {
            what: "analysis",
            reason: "expected a JSON object of metrics".to_owned(),
        })?;
        debug!(metrics = payload.keys().count(), "analysis decoded");
        Ok(payload)
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, ServiceError> {
        self.http
            .post(format!("{}/{path}", self.base_url))
            .json(body)
            .send()
            .map_err(|source| ServiceError::Connection {
                base_url: self.base_url.clone(),
                source,
            })
    }
}

pub fn validate_base_url(base_url: &str) -> Result<(), ServiceError> {
    let invalid = |reason: &str| ServiceError::InvalidUrl {
        url: base_url.to_owned(),
        reason: reason.to_owned(),
    };
    if base_url.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    let parsed = Url::parse(base_url).map_err(|error| invalid(&error.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme {other:?}; use http or https"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(())
}

fn read_success_body(response: Response) -> Result<String, ServiceError> {
    let status = response.status();
    let body = response.text();
    if !status.is_success() {
        return Err(clean_error_response(status, &body.unwrap_or_default()));
    }
    body.map_err(ServiceError::Body)
}

fn clean_error_response(status: StatusCode, body: &str) -> ServiceError {
    let message = if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message()
    {
        message
    } else if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        body.trim().to_owned()
    } else {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    };
    ServiceError::Status {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Serialize)]
struct YearsRequest<'a> {
    transcript: &'a str,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    transcript: &'a str,
    year: &'a Year,
}

#[derive(Debug, Deserialize)]
struct YearsResponse {
    available_years: Vec<Year>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    detail: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    fn message(self) -> Option<String> {
        if let Some(error) = self.error
            && !error.is_empty()
        {
            return Some(error);
        }
        match self.detail? {
            serde_json::Value::String(detail) if !detail.is_empty() => Some(detail),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

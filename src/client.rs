use anyhow::{Context, Result};
use colored::*;
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{Config, DEFAULT_API_URL};
use crate::fields;
use crate::models::{GenerateRequest, RandomRequest};

/// Fixed pause between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const JSON_UTF8: &str = "application/json; charset=utf-8";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health probe with a short timeout. Only HTTP 200 counts as healthy.
    pub async fn check_health(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .context("Failed to connect to generation service")?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("Service health check failed with status {}", response.status());
        }

        Ok(())
    }

    /// Model listing, passed through verbatim for the operator.
    pub async fn list_models(&self) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .context("Failed to list models")?;

        response.text().await.context("Failed to read models response")
    }

    pub async fn submit_generate(&self, request: &GenerateRequest) -> Result<String> {
        request.validate()?;

        let response = self
            .http
            .post(format!("{}/v1/music/generate", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, JSON_UTF8)
            .body(serde_json::to_string(request)?)
            .send()
            .await
            .context("Failed to submit generation request")?;

        let body = response
            .text()
            .await
            .context("Failed to read submission response")?;
        extract_job_id(&body)
    }

    pub async fn submit_random(&self, thinking: bool) -> Result<String> {
        let request = RandomRequest { thinking };
        let response = self
            .http
            .post(format!("{}/v1/music/random", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, JSON_UTF8)
            .body(serde_json::to_string(&request)?)
            .send()
            .await
            .context("Failed to submit random generation request")?;

        let body = response
            .text()
            .await
            .context("Failed to read submission response")?;
        extract_job_id(&body)
    }

    /// Raw job document. The body is kept verbatim because a terminal
    /// response is persisted exactly as received.
    pub async fn fetch_job(&self, job_id: &str) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/v1/jobs/{}", self.base_url, job_id))
            .send()
            .await
            .context("Failed to fetch job status")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Service error: {}",
                response.text().await.unwrap_or_default()
            );
        }

        response.text().await.context("Failed to read job status response")
    }

    /// Downloads a service-relative path (e.g. an audio artifact).
    pub async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Download of {} failed with status {}", url, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        Ok(bytes.to_vec())
    }

    /// Polls at the production cadence until the job reaches a terminal
    /// state. Runs unbounded; the operator cancels with Ctrl-C.
    pub async fn poll_job(
        &self,
        job_id: &str,
        observe: impl FnMut(&PollState),
    ) -> Result<PollOutcome> {
        poll_job_with(
            job_id,
            POLL_INTERVAL,
            |id| async move { self.fetch_job(&id).await },
            observe,
        )
        .await
    }
}

/// Picks the job id out of a submission response. Anything without one is a
/// failed submission and the raw body is surfaced for the operator.
pub fn extract_job_id(body: &str) -> Result<String> {
    let doc: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    match fields::text_at(&doc, "job_id") {
        Some(id) if !id.is_empty() => Ok(id),
        _ => anyhow::bail!("Submission failed, no job_id in response: {}", body),
    }
}

/// One observed job state. `succeeded` and `failed` are the only terminal
/// statuses; any unrecognized status string means the job is still running.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Queued { position: Option<u64> },
    InProgress { status: String },
    Succeeded,
    Failed { error: String },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Succeeded | PollState::Failed { .. })
    }
}

/// Classifies a raw job document into a poll state.
pub fn classify(body: &str) -> PollState {
    let doc: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let status = fields::text_at(&doc, "status").unwrap_or_default();

    match status.as_str() {
        "succeeded" => PollState::Succeeded,
        "failed" => PollState::Failed {
            error: fields::text_at(&doc, "error").unwrap_or_default(),
        },
        "queued" => PollState::Queued {
            position: fields::value_at(&doc, "queue_position").and_then(Value::as_u64),
        },
        other => PollState::InProgress {
            status: other.to_string(),
        },
    }
}

/// The last observed state plus the verbatim body it was derived from.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub state: PollState,
    pub body: String,
}

/// Core poll loop, generic over the fetch so the cadence and termination
/// rule are testable against a scripted response sequence. Each iteration
/// fetches, classifies, reports the state to `observe`, and either returns
/// (terminal) or sleeps `delay` and continues. There is no iteration cap.
pub async fn poll_job_with<F, Fut>(
    job_id: &str,
    delay: Duration,
    mut fetch: F,
    mut observe: impl FnMut(&PollState),
) -> Result<PollOutcome>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    loop {
        let body = fetch(job_id.to_string()).await?;
        let state = classify(&body);
        observe(&state);

        if state.is_terminal() {
            return Ok(PollOutcome { state, body });
        }

        sleep(delay).await;
    }
}

/// Connection guard: verify the configured endpoint, and if it is down,
/// negotiate a replacement with the operator. One prompt, one re-probe; a
/// second failure ends the command.
pub async fn ensure_connection(config: &mut Config) -> Result<ApiClient> {
    let client = ApiClient::new(config.api_url.clone());
    match client.check_health().await {
        Ok(()) => return Ok(client),
        Err(e) => {
            println!(
                "{} Cannot reach generation service at {}: {}",
                "✗".red(),
                config.api_url,
                e
            );
        }
    }

    let replacement = inquire::Text::new("Service URL:")
        .with_default(DEFAULT_API_URL)
        .with_help_message("Press Enter to use the default endpoint")
        .prompt()
        .context("Endpoint negotiation aborted")?;

    let client = ApiClient::new(replacement.trim().to_string());
    client
        .check_health()
        .await
        .with_context(|| format!("Service at {} is unreachable", client.base_url()))?;

    config.api_url = client.base_url().to_string();
    config.save()?;
    println!("{} Saved service URL: {}", "✓".green(), config.api_url);

    Ok(client)
}

//! Request/response contracts of the supported try-on providers.

use serde_json::{json, Value};
use std::future::Future;
use tracing::warn;

use crate::error::{Result, TryOnError};
use crate::transport::{HttpReply, Transport};
use crate::types::{
    FitPreference, GarmentCategory, GenerationRequest, JobHandle, JobStatus, PromptBundle,
    Provider,
};

/// What a provider hands back after submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The provider answered synchronously with the final payload.
    Completed(Value),
    /// The job was queued and must be polled.
    Queued(JobHandle),
}

/// One remote provider's payload format and HTTP contract.
///
/// The orchestrator drives every provider through the same
/// `build_payload` → `submit` → (`poll_status` → `fetch_result`) cycle; only
/// providers that return [`Submission::Queued`] are ever polled.
pub trait ProviderAdapter: Send + Sync {
    /// Tag reported back to the caller.
    fn provider(&self) -> Provider;

    /// Whether [`ProviderAdapter::build_payload`] needs a [`PromptBundle`].
    fn needs_prompt(&self) -> bool;

    /// Build the JSON request body. Fails validation if either image is missing.
    fn build_payload(
        &self,
        request: &GenerationRequest,
        prompt: Option<&PromptBundle>,
    ) -> Result<Value>;

    fn submit<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<Submission>> + Send;

    fn poll_status<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        handle: &JobHandle,
    ) -> impl Future<Output = Result<JobStatus>> + Send;

    fn fetch_result<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        handle: &JobHandle,
    ) -> impl Future<Output = Result<Value>> + Send;
}

fn submission_error(reply: HttpReply) -> TryOnError {
    TryOnError::Submission {
        status: reply.status,
        body: reply.body,
    }
}

fn polling_error(reply: HttpReply) -> TryOnError {
    TryOnError::Polling {
        status: reply.status,
        body: reply.body,
    }
}

// ── Direct provider ────────────────────────────────────────────────

/// Category vocabulary of the direct try-on model.
pub fn direct_category(category: GarmentCategory) -> &'static str {
    match category {
        GarmentCategory::Top => "tops",
        GarmentCategory::Bottom => "bottoms",
        GarmentCategory::Dress => "one-pieces",
        GarmentCategory::Undergarment => "auto",
    }
}

/// Quality/speed mode of the direct try-on model.
pub fn direct_mode(fit: FitPreference) -> &'static str {
    match fit {
        FitPreference::Tight => "quality",
        FitPreference::Regular => "balanced",
        FitPreference::Loose => "performance",
    }
}

/// Synchronous try-on model: one POST returns the finished image.
///
/// Takes no prompt; styling is inferred from `category` and `mode`.
#[derive(Debug, Clone)]
pub struct DirectProvider {
    endpoint: String,
}

impl DirectProvider {
    /// Create an adapter posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ProviderAdapter for DirectProvider {
    fn provider(&self) -> Provider {
        Provider::Direct
    }

    fn needs_prompt(&self) -> bool {
        false
    }

    fn build_payload(
        &self,
        request: &GenerationRequest,
        _prompt: Option<&PromptBundle>,
    ) -> Result<Value> {
        let (subject, garment) = request.image_uris()?;
        Ok(json!({
            "model_image": subject,
            "garment_image": garment,
            "category": direct_category(request.garment_category),
            "mode": direct_mode(request.fit_preference),
            "garment_photo_type": "auto",
            "moderation_level": "permissive",
            "segmentation_free": true,
            "num_samples": 1,
            "output_format": "png",
        }))
    }

    async fn submit<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        payload: &Value,
    ) -> Result<Submission> {
        let reply = transport.post_json(&self.endpoint, api_key, payload).await?;
        if !reply.is_success() {
            return Err(submission_error(reply));
        }
        Ok(Submission::Completed(reply.json()?))
    }

    async fn poll_status<T: Transport>(
        &self,
        _transport: &T,
        _api_key: &str,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        Err(TryOnError::InvalidResponse(format!(
            "Direct provider has no job {} to poll",
            handle.request_id
        )))
    }

    async fn fetch_result<T: Transport>(
        &self,
        _transport: &T,
        _api_key: &str,
        handle: &JobHandle,
    ) -> Result<Value> {
        Err(TryOnError::InvalidResponse(format!(
            "Direct provider has no job {} to fetch",
            handle.request_id
        )))
    }
}

// ── Queue provider ─────────────────────────────────────────────────

/// Prompt-driven image editor behind an asynchronous job queue.
#[derive(Debug, Clone)]
pub struct QueueProvider {
    endpoint: String,
}

impl QueueProvider {
    /// Create an adapter posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a [`JobHandle`] from the submission reply, deriving any
    /// endpoint the provider left out.
    fn job_handle(&self, json: &Value) -> Result<JobHandle> {
        let request_id = json
            .get("request_id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                TryOnError::InvalidResponse("Queue submission response missing request_id".into())
            })?
            .to_string();

        let url_field = |key: &str| {
            json.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let status_url = url_field("status_url")
            .unwrap_or_else(|| format!("{}/requests/{}/status", self.endpoint, request_id));
        let result_url = url_field("response_url")
            .unwrap_or_else(|| format!("{}/requests/{}", self.endpoint, request_id));

        Ok(JobHandle {
            request_id,
            status_url,
            result_url,
        })
    }
}

fn with_logs(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}logs=1", url, sep)
}

/// Parse a status payload. Log lines are only kept for failed jobs.
pub(crate) fn parse_status(json: &Value) -> Result<JobStatus> {
    let status = json
        .get("status")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TryOnError::InvalidResponse("Status response missing status".into()))?;

    Ok(match JobStatus::parse(status) {
        JobStatus::Failed { .. } => JobStatus::Failed {
            logs: collect_logs(json),
        },
        other => other,
    })
}

fn collect_logs(json: &Value) -> Vec<String> {
    let mut logs: Vec<String> = json
        .get("logs")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    entry
                        .as_str()
                        .or_else(|| entry.get("message").and_then(|m| m.as_str()))
                        .map(String::from)
                })
                .collect()
        })
        .unwrap_or_default();
    if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
        logs.push(error.to_string());
    }
    logs
}

impl ProviderAdapter for QueueProvider {
    fn provider(&self) -> Provider {
        Provider::Queue
    }

    fn needs_prompt(&self) -> bool {
        true
    }

    fn build_payload(
        &self,
        request: &GenerationRequest,
        prompt: Option<&PromptBundle>,
    ) -> Result<Value> {
        let (subject, garment) = request.image_uris()?;
        let prompt = prompt.ok_or_else(|| {
            TryOnError::Validation("Queue provider requires a prompt".into())
        })?;
        Ok(json!({
            "prompt": prompt.prompt,
            "negative_prompt": prompt.negative_prompt,
            "image_urls": [subject, garment],
            "num_images": 1,
            "output_format": "jpeg",
        }))
    }

    async fn submit<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        payload: &Value,
    ) -> Result<Submission> {
        let reply = transport.post_json(&self.endpoint, api_key, payload).await?;
        if !reply.is_success() {
            return Err(submission_error(reply));
        }
        // A success reply without a usable request id is still a rejected submission.
        match reply.json().and_then(|json| self.job_handle(&json)) {
            Ok(handle) => Ok(Submission::Queued(handle)),
            Err(e) => {
                warn!(error = %e, "malformed queue submission reply");
                Err(submission_error(reply))
            }
        }
    }

    async fn poll_status<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        let reply = transport.get(&with_logs(&handle.status_url), api_key).await?;
        if !reply.is_success() {
            return Err(polling_error(reply));
        }
        match reply.json().and_then(|json| parse_status(&json)) {
            Ok(status) => Ok(status),
            Err(e) => {
                warn!(request_id = %handle.request_id, error = %e, "malformed status reply");
                Err(polling_error(reply))
            }
        }
    }

    async fn fetch_result<T: Transport>(
        &self,
        transport: &T,
        api_key: &str,
        handle: &JobHandle,
    ) -> Result<Value> {
        let reply = transport.get(&handle.result_url, api_key).await?;
        if !reply.is_success() {
            return Err(polling_error(reply));
        }
        reply.json()
    }
}

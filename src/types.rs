use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, Result, TryOnError};

/// Gender of the subject in the portrait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unisex,
}

/// Broad category of the garment being tried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Top,
    Bottom,
    Dress,
    Undergarment,
}

/// How closely the garment should follow the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPreference {
    Tight,
    Regular,
    Loose,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unisex];
}

impl GarmentCategory {
    pub const ALL: [GarmentCategory; 4] = [
        GarmentCategory::Top,
        GarmentCategory::Bottom,
        GarmentCategory::Dress,
        GarmentCategory::Undergarment,
    ];
}

impl FitPreference {
    pub const ALL: [FitPreference; 3] = [
        FitPreference::Tight,
        FitPreference::Regular,
        FitPreference::Loose,
    ];
}

/// Which remote service performs the try-on.
///
/// `Direct` answers in a single request; `Queue` is submitted to a job
/// queue and polled until it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(alias = "fashn")]
    Direct,
    #[serde(alias = "nano-banana")]
    Queue,
}

impl Provider {
    /// Tag used on the wire and in logs (`direct` or `queue`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Direct => "direct",
            Provider::Queue => "queue",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "fashn" => Ok(Provider::Direct),
            "queue" | "nano-banana" => Ok(Provider::Queue),
            other => Err(TryOnError::Validation(format!(
                "Unsupported provider '{}'",
                other
            ))),
        }
    }
}

/// An input image, either already hosted or held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An `http(s)://` or `data:` URI passed to the provider unchanged.
    Url(String),
    /// Raw encoded image bytes (PNG, JPEG, ...) with their MIME type.
    Bytes { data: Vec<u8>, mime: String },
}

impl ImageSource {
    /// An image already reachable by URL (or a `data:` URI).
    pub fn url(url: impl Into<String>) -> Self {
        ImageSource::Url(url.into())
    }

    /// In-memory image bytes, sent as a base64 `data:` URI.
    pub fn bytes(data: Vec<u8>, mime: impl Into<String>) -> Self {
        ImageSource::Bytes {
            data,
            mime: mime.into(),
        }
    }

    /// True if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        match self {
            ImageSource::Url(url) => url.trim().is_empty(),
            ImageSource::Bytes { data, .. } => data.is_empty(),
        }
    }

    /// The string form providers accept in an image field.
    pub fn to_uri(&self) -> String {
        match self {
            ImageSource::Url(url) => url.trim().to_string(),
            ImageSource::Bytes { data, mime } => format!(
                "data:{};base64,{}",
                mime,
                base64::engine::general_purpose::STANDARD.encode(data)
            ),
        }
    }
}

/// A single user-initiated try-on request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub subject_image: Option<ImageSource>,
    pub garment_image: Option<ImageSource>,
    pub gender: Gender,
    pub garment_category: GarmentCategory,
    pub fit_preference: FitPreference,
    pub provider: Provider,
}

impl GenerationRequest {
    /// Create a request with unisex / top / regular defaults on the direct provider.
    pub fn new(subject_image: ImageSource, garment_image: ImageSource) -> Self {
        Self {
            subject_image: Some(subject_image),
            garment_image: Some(garment_image),
            gender: Gender::Unisex,
            garment_category: GarmentCategory::Top,
            fit_preference: FitPreference::Regular,
            provider: Provider::Direct,
        }
    }

    /// Set the subject's gender.
    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Set the garment category.
    pub fn garment_category(mut self, category: GarmentCategory) -> Self {
        self.garment_category = category;
        self
    }

    /// Set the fit preference.
    pub fn fit_preference(mut self, fit: FitPreference) -> Self {
        self.fit_preference = fit;
        self
    }

    /// Choose the provider that runs the job.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Both image URIs, or a validation error naming the missing one.
    pub fn image_uris(&self) -> Result<(String, String)> {
        let subject = present(&self.subject_image, "subject")?;
        let garment = present(&self.garment_image, "garment")?;
        Ok((subject, garment))
    }
}

fn present(image: &Option<ImageSource>, label: &str) -> Result<String> {
    match image {
        Some(img) if !img.is_empty() => Ok(img.to_uri()),
        _ => Err(TryOnError::Validation(format!("Missing {} image", label))),
    }
}

/// Positive and negative prompt text for prompt-driven providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBundle {
    pub prompt: String,
    pub negative_prompt: String,
}

/// Identifier and endpoints of one in-flight queued job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub request_id: String,
    pub status_url: String,
    pub result_url: String,
}

/// Status of a queued job as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    InQueue,
    InProgress,
    Completed,
    Failed { logs: Vec<String> },
    /// A status string we do not recognize. Never terminal.
    Unknown(String),
}

impl JobStatus {
    /// Parse a provider status string.
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "IN_QUEUE" => JobStatus::InQueue,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed { logs: Vec::new() },
            _ => JobStatus::Unknown(status.to_string()),
        }
    }

    /// True for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed { .. })
    }
}

/// A successfully generated try-on image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub image_url: String,
    pub provider_used: Provider,
}

/// JSON reply handed back to the UI: `{image, provider}` on success,
/// `{error, kind, provider}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub provider: Provider,
}

impl GenerationResponse {
    /// Shape an execution outcome; `provider` is reported when it failed.
    pub fn from_result(provider: Provider, result: &Result<GenerationResult>) -> Self {
        match result {
            Ok(ok) => Self {
                image: Some(ok.image_url.clone()),
                error: None,
                kind: None,
                provider: ok.provider_used,
            },
            Err(e) => Self {
                image: None,
                error: Some(e.to_string()),
                kind: Some(e.kind()),
                provider,
            },
        }
    }
}

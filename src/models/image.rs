use crate::error::{DalleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Upper bound on images per generation call.
pub const MAX_IMAGES: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageSize {
    Small,
    Medium,
    Large,
}

impl ImageSize {
    pub fn dimension(&self) -> u32 {
        match self {
            ImageSize::Small => 256,
            ImageSize::Medium => 512,
            ImageSize::Large => 1024,
        }
    }
}

// Only square images are requested.
impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.dimension(), self.dimension())
    }
}

impl Serialize for ImageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Url,
    B64Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    prompt: String,
    #[serde(rename = "n", skip_serializing_if = "Option::is_none")]
    count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<ImageSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            count: None,
            size: None,
            response_format: None,
            user: None,
        }
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn count(&self) -> Option<u8> {
        self.count
    }

    pub fn size(&self) -> Option<ImageSize> {
        self.size
    }

    pub fn response_format(&self) -> Option<ResponseFormat> {
        self.response_format
    }

    /// Checks the request locally so bad input never costs an API call.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(DalleError::RequestError("prompt must not be empty".into()));
        }
        match self.count {
            Some(0) => Err(DalleError::RequestError(
                "image count must be at least 1".into(),
            )),
            Some(n) if n > MAX_IMAGES => Err(DalleError::RequestError(format!(
                "image count {} exceeds the maximum of {}",
                n, MAX_IMAGES
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    pub created: i64,
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageData {
    pub url: Option<String>,
    pub b64_json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    Url(String),
    Base64(String),
}

impl ImageReference {
    /// Short human-readable description used in logs and outcomes.
    pub fn describe(&self, index: usize) -> String {
        match self {
            ImageReference::Url(url) => url.clone(),
            ImageReference::Base64(_) => format!("embedded image #{}", index + 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub created: i64,
    pub images: Vec<ImageReference>,
}

impl GenerationResult {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.created, 0)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl TryFrom<GenerationResponse> for GenerationResult {
    type Error = DalleError;

    fn try_from(response: GenerationResponse) -> Result<Self> {
        let images = response
            .data
            .into_iter()
            .enumerate()
            .map(|(i, datum)| match (datum.url, datum.b64_json) {
                (Some(url), _) => Ok(ImageReference::Url(url)),
                (None, Some(b64)) => Ok(ImageReference::Base64(b64)),
                (None, None) => Err(DalleError::ResponseError(format!(
                    "result #{} carries neither url nor b64_json",
                    i + 1
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GenerationResult {
            created: response.created,
            images,
        })
    }
}

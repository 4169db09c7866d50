use crate::{
    error::{DalleError, Result},
    models::{GenerationRequest, GenerationResponse, GenerationResult},
    openai::status_label,
};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ImageClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generations", self.base_url.trim_end_matches('/'))
    }

    /// Sends one generation request and returns the image references in the
    /// order the API listed them.
    ///
    /// Any non-200 reply becomes [`DalleError::ApiError`]; the caller decides
    /// whether that aborts the run.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.validate()?;

        let url = self.endpoint();
        let request_json = serde_json::to_string(request)
            .map_err(|e| DalleError::SerializationError(e.to_string()))?;

        log::info!(
            "Requesting {} image(s) from {}",
            request.count().unwrap_or(1),
            url
        );
        log::debug!("Generation request payload: {}", request_json);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(request_json)
            .send()
            .await
            .map_err(|e| DalleError::ClientError(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    log::debug!("Could not read generation API error body: {}", e);
                    String::new()
                }
            };
            let label = status_label(status.as_u16());
            log::error!("Generation API returned {} ({})", status.as_u16(), label);
            if !body.is_empty() {
                log::debug!("Generation API error body: {}", body);
            }
            return Err(DalleError::ApiError {
                status: status.as_u16(),
                label,
                body,
            });
        }

        let response_str = response
            .text()
            .await
            .map_err(|e| DalleError::ClientError(e.to_string()))?;

        let parsed: GenerationResponse = serde_json::from_str(&response_str)
            .map_err(|e| DalleError::ResponseError(e.to_string()))?;

        let result = GenerationResult::try_from(parsed)?;
        log::info!("Generation API returned {} image(s)", result.len());

        Ok(result)
    }
}

use crate::{
    config::GeminiConfig,
    error::{InpaintError, Result},
    models::{
        ApiErrorBody, Content, EditRequest, EditedImage, GenerateContentRequest,
        GenerateContentResponse, GenerationConfig, Part, ResponseModality,
    },
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;

/// Calls `models/{model}:generateContent` with an image, a mask and a prompt.
#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl ImageClient {
    pub fn new(client: Client, config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| InpaintError::ConfigError("Gemini API key is required".into()))?;

        Ok(Self {
            client,
            api_key,
            model: config.model_or_default().to_string(),
            endpoint: config.endpoint_or_default().to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Image, mask and prompt as a single three-part content.
    pub fn build_request(request: &EditRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::inline(request.image.mime_type(), request.image.to_base64()),
                    Part::inline(request.mask.mime_type(), request.mask.to_base64()),
                    Part::text(request.prompt.clone()),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec![ResponseModality::Image],
            }),
        }
    }

    pub fn parse_response(response: &GenerateContentResponse) -> Result<EditedImage> {
        let inline = response.first_inline_data().ok_or_else(|| {
            InpaintError::ApiError("No image found in the Gemini API response.".into())
        })?;
        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| InpaintError::ApiError(format!("Invalid image data: {}", e)))?;

        Ok(EditedImage::new(inline.mime_type.clone(), bytes))
    }

    pub async fn edit(&self, request: &EditRequest) -> Result<EditedImage> {
        let payload = Self::build_request(request);

        log::info!("Requesting image edit with model: {}", self.model);
        log::debug!(
            "Edit request: image {} ({} bytes), mask {}x{} ({} bytes), prompt {:?}",
            request.image.mime_type(),
            request.image.bytes().len(),
            request.mask.width,
            request.mask.height,
            request.mask.bytes.len(),
            request.prompt
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| InpaintError::RequestError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InpaintError::ResponseError(e.to_string()))?;

        Self::parse_body(status, &body)
    }

    /// Turns a raw HTTP outcome into the edited image or an error.
    pub fn parse_body(status: reqwest::StatusCode, body: &str) -> Result<EditedImage> {
        if !status.is_success() {
            log::error!("Gemini returned {}: {}", status, body);
            return Err(InpaintError::ApiError(error_message(body, status)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| InpaintError::SerializationError(e.to_string()))?;
        Self::parse_response(&parsed)
    }
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("HTTP {}", status),
    }
}

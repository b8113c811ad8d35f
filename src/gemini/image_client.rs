use crate::{
    config::{ApiKey, GeminiConfig},
    error::{Result, StickerError},
    gemini::ImageGenerator,
    models::{ContentPart, ImageGenerationRequest, ImageGenerationResponse, ImagePayload, DEFAULT_IMAGE_MIME},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    base_url: String,
}

impl GeminiImageClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| StickerError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

pub(crate) fn build_request_payload(request: &ImageGenerationRequest) -> Value {
    let parts: Vec<Value> = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::InlineData(image) => json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.to_base64()
                }
            }),
            ContentPart::Text(text) => json!({ "text": text }),
        })
        .collect();

    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "candidateCount": 1,
            "imageConfig": { "aspectRatio": request.aspect_ratio }
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Turns a non-2xx body into an error whose message keeps the API status
/// string. Bodies that are not a Gemini error envelope (proxy HTML, plain
/// text) are replaced by the HTTP reason phrase.
pub(crate) fn api_error(status: u16, body: &str) -> StickerError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(api_status) => format!("{} {}", api_status, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => {
            log::debug!("Unparsed error body ({} bytes) for status {}", body.len(), status);
            StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status))
        }
    };
    StickerError::ApiError {
        status: Some(status),
        message,
    }
}

pub(crate) fn parse_response(body: &str, model: &str) -> Result<ImageGenerationResponse> {
    let decoded: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| StickerError::ResponseError(e.to_string()))?;

    if let Some(reason) = decoded.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(StickerError::ApiError {
            status: None,
            message: format!("SAFETY: prompt blocked ({})", reason),
        });
    }

    let mut parts = Vec::new();
    let mut finish_reason = None;
    if let Some(candidate) = decoded.candidates.into_iter().next() {
        finish_reason = candidate.finish_reason;
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                let data = STANDARD
                    .decode(inline.data.as_bytes())
                    .map_err(|e| StickerError::ResponseError(format!("image data: {}", e)))?;
                let mime_type = inline
                    .mime_type
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                parts.push(ContentPart::InlineData(ImagePayload::new(data, mime_type)));
            } else if let Some(text) = part.text {
                parts.push(ContentPart::Text(text));
            }
        }
    }

    let has_image = parts
        .iter()
        .any(|p| matches!(p, ContentPart::InlineData(_)));
    if let Some(reason) = finish_reason.filter(|r| !has_image && r.contains("SAFETY")) {
        return Err(StickerError::ApiError {
            status: None,
            message: format!("{}: image withheld by safety filter", reason),
        });
    }

    Ok(ImageGenerationResponse {
        parts,
        model: model.to_string(),
    })
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate(
        &self,
        api_key: &ApiKey,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse> {
        let payload = build_request_payload(request);
        let url = self.endpoint(&request.model);

        log::info!("Generating image with model: {}", request.model);
        log::debug!(
            "Request has {} part(s), aspect ratio {}",
            request.parts.len(),
            request.aspect_ratio
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {}", e);
                StickerError::RequestError(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StickerError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            log::warn!("Gemini returned {}", status);
            return Err(api_error(status.as_u16(), &body));
        }

        parse_response(&body, &request.model)
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use stickergen::{
    ApiKey, Config, ContentPart, CredentialConfig, ImageGenerationRequest,
    ImageGenerationResponse, ImageGenerator, ImagePayload, RetryPolicy, StickerError,
};

/// Replays a fixed script of responses and records every request it sees.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Reply>>,
    pub calls: Mutex<Vec<ImageGenerationRequest>>,
}

pub enum Reply {
    Image(Vec<u8>),
    Empty,
    Status(u16, &'static str),
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _api_key: &ApiKey,
        request: &ImageGenerationRequest,
    ) -> stickergen::Result<ImageGenerationResponse> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("generator called more often than scripted");

        match reply {
            Reply::Image(bytes) => Ok(ImageGenerationResponse {
                parts: vec![ContentPart::InlineData(ImagePayload::new(bytes, "image/png"))],
                model: request.model.clone(),
            }),
            Reply::Empty => Ok(ImageGenerationResponse {
                parts: vec![ContentPart::Text("no picture today".into())],
                model: request.model.clone(),
            }),
            Reply::Status(status, message) => Err(StickerError::ApiError {
                status: Some(status),
                message: message.to_string(),
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config::new()
        .with_credentials(CredentialConfig::new().with_api_key("test-key"))
        .with_retry(
            RetryPolicy::new()
                .with_backoff_base(Duration::from_millis(500))
                .with_pacing_delay(Duration::from_millis(1_000)),
        )
}

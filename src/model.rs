//! Image generation through Amazon Bedrock.

use std::future::Future;
use std::pin::Pin;

use aws_sdk_bedrockruntime::primitives::Blob;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use tracing::debug;

use crate::config::ModelConfig;
use crate::{AppError, Result};

/// Port for the generative-image model.
pub trait ImageModel: Send + Sync {
    /// Generate a PNG for `prompt`, returning the raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Model`](crate::AppError::Model) on invocation or
    /// response decoding failure.
    fn generate(&self, prompt: &str) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>>;
}

/// Bedrock Stable Diffusion XL implementation of [`ImageModel`].
pub struct BedrockImageModel {
    client: aws_sdk_bedrockruntime::Client,
    config: ModelConfig,
}

impl BedrockImageModel {
    /// Create a model client with fixed invocation parameters.
    #[must_use]
    pub fn new(client: aws_sdk_bedrockruntime::Client, config: ModelConfig) -> Self {
        Self { client, config }
    }

    async fn generate_inner(&self, prompt: String) -> Result<Vec<u8>> {
        // Only the seed varies between invocations.
        let seed: u32 = rand::random();
        let request = json!({
            "text_prompts": [{"text": prompt}],
            "style_preset": self.config.style_preset,
            "seed": seed,
            "cfg_scale": self.config.cfg_scale,
            "steps": self.config.steps,
        });
        let body = serde_json::to_vec(&request)
            .map_err(|err| AppError::Model(format!("failed to encode model request: {err}")))?;

        debug!(model_id = %self.config.model_id, seed, "invoking image model");
        let response = self
            .client
            .invoke_model()
            .model_id(&self.config.model_id)
            .content_type("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|err| AppError::Model(format!("invoke_model failed: {err}")))?;

        let payload: serde_json::Value = serde_json::from_slice(response.body().as_ref())
            .map_err(|err| AppError::Model(format!("model response is not JSON: {err}")))?;
        let encoded = payload["artifacts"][0]["base64"]
            .as_str()
            .ok_or_else(|| AppError::Model("model response missing artifacts[0].base64".into()))?;

        BASE64
            .decode(encoded)
            .map_err(|err| AppError::Model(format!("model artifact is not valid base64: {err}")))
    }
}

impl ImageModel for BedrockImageModel {
    fn generate(&self, prompt: &str) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        let prompt = prompt.to_owned();
        Box::pin(async move { self.generate_inner(prompt).await })
    }
}

//! Global configuration parsing, validation, and secret loading.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::secrets;
use crate::{AppError, Result};

/// Image model invocation parameters.
///
/// Every request to the model carries this fixed shape; only the seed
/// varies per invocation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ModelConfig {
    /// Bedrock model identifier.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Style preset passed to the model.
    #[serde(default = "default_style_preset")]
    pub style_preset: String,
    /// Classifier-free guidance scale.
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: u32,
    /// Diffusion step count.
    #[serde(default = "default_steps")]
    pub steps: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            style_preset: default_style_preset(),
            cfg_scale: default_cfg_scale(),
            steps: default_steps(),
        }
    }
}

fn default_model_id() -> String {
    "stability.stable-diffusion-xl-v1".into()
}

fn default_style_preset() -> String {
    "photographic".into()
}

fn default_cfg_scale() -> u32 {
    10
}

fn default_steps() -> u32 {
    30
}

fn default_http_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

fn default_signature_tolerance() -> i64 {
    300
}

fn default_dedup_retention_days() -> u32 {
    30
}

/// Global configuration parsed from `config.toml`.
///
/// Secrets are loaded at runtime via Secrets Manager or environment
/// variables, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port the webhook listener binds to.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Address the webhook listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// DynamoDB table holding deduplication records.
    pub dedup_table: String,
    /// S3 bucket generated images are written to.
    pub image_bucket: String,
    /// Content-delivery domain fronting the image bucket.
    pub cdn_domain: String,
    /// Secrets Manager ID of the Slack bot token secret.
    pub slack_token_secret_id: String,
    /// Secrets Manager ID of the Slack signing secret.
    pub signing_secret_id: String,
    /// Maximum accepted skew, in seconds, between the signature timestamp
    /// and server time.
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_seconds: i64,
    /// Days before a dedup record's `expires_at` TTL attribute elapses.
    #[serde(default = "default_dedup_retention_days")]
    pub dedup_retention_days: u32,
    /// Image model invocation parameters.
    #[serde(default)]
    pub model: ModelConfig,
    /// Slack bot token used for posting replies (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
    /// Slack signing secret used for request verification (populated at
    /// runtime).
    #[serde(skip)]
    pub signing_secret: String,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack credentials from Secrets Manager with env-var fallback.
    ///
    /// The secret payloads follow the Slack app convention:
    /// `{"token": ...}` for the bot token and `{"secret": ...}` for the
    /// signing secret. Falls back to `SLACK_BOT_TOKEN` /
    /// `SLACK_SIGNING_SECRET` when the lookup fails.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Secrets` if neither Secrets Manager nor env vars
    /// provide a credential.
    pub async fn load_secrets(&mut self, client: &aws_sdk_secretsmanager::Client) -> Result<()> {
        self.bot_token = secrets::load_secret_field(
            client,
            &self.slack_token_secret_id,
            "token",
            "SLACK_BOT_TOKEN",
        )
        .await?;
        self.signing_secret = secrets::load_secret_field(
            client,
            &self.signing_secret_id,
            "secret",
            "SLACK_SIGNING_SECRET",
        )
        .await?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.dedup_table.is_empty() {
            return Err(AppError::Config("dedup_table must not be empty".into()));
        }
        if self.image_bucket.is_empty() {
            return Err(AppError::Config("image_bucket must not be empty".into()));
        }
        if self.cdn_domain.is_empty() {
            return Err(AppError::Config("cdn_domain must not be empty".into()));
        }
        if self.signature_tolerance_seconds <= 0 {
            return Err(AppError::Config(
                "signature_tolerance_seconds must be greater than zero".into(),
            ));
        }
        if self.dedup_retention_days == 0 {
            return Err(AppError::Config(
                "dedup_retention_days must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

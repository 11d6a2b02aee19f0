//! Runtime credential loading from AWS Secrets Manager.

use std::env;

use tracing::warn;

use crate::{AppError, Result};

/// Load a single credential field from a Secrets Manager JSON secret,
/// falling back to an environment variable.
///
/// The secret's string payload is expected to be a JSON object with the
/// credential under `field` (e.g. `{"token": "xoxb-..."}`). A failed
/// lookup, a non-JSON payload, or an empty field all fall through to the
/// env var.
///
/// # Errors
///
/// Returns `AppError::Secrets` if neither source provides a value.
pub async fn load_secret_field(
    client: &aws_sdk_secretsmanager::Client,
    secret_id: &str,
    field: &str,
    env_key: &str,
) -> Result<String> {
    match fetch_field(client, secret_id, field).await {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(secret_id, field, "secret field is empty, trying env var");
        }
        Err(err) => {
            warn!(secret_id, field, %err, "secret lookup failed, trying env var");
        }
    }

    env::var(env_key).map_err(|_| {
        AppError::Secrets(format!(
            "credential {secret_id}:{field} not found in Secrets Manager or {env_key} env var"
        ))
    })
}

async fn fetch_field(
    client: &aws_sdk_secretsmanager::Client,
    secret_id: &str,
    field: &str,
) -> Result<String> {
    let output = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|err| AppError::Secrets(format!("get_secret_value {secret_id}: {err}")))?;

    let payload = output
        .secret_string()
        .ok_or_else(|| AppError::Secrets(format!("secret {secret_id} has no string payload")))?;

    let json: serde_json::Value = serde_json::from_str(payload)
        .map_err(|err| AppError::Secrets(format!("secret {secret_id} is not JSON: {err}")))?;

    json.get(field)
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::Secrets(format!("secret {secret_id} missing field {field}")))
}

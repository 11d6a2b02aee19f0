//! Block Kit builders for the generated-image reply.

use serde_json::{json, Value};

/// Build the mrkdwn section block crediting the requesting user.
#[must_use]
pub fn mention_section(user: &str) -> Value {
    json!({
        "type": "section",
        "text": {
            "type": "mrkdwn",
            "text": format!("<@{user}> Generated Image:")
        }
    })
}

/// Build the image block referencing the generated image's public URL.
#[must_use]
pub fn image_block(image_url: &str) -> Value {
    json!({
        "type": "image",
        "image_url": image_url,
        "alt_text": "Generated Image"
    })
}

/// Build the full `chat.postMessage` body for a generated-image reply.
#[must_use]
pub fn reply_body(channel: &str, user: &str, image_url: &str) -> Value {
    json!({
        "channel": channel,
        "blocks": [mention_section(user), image_block(image_url)]
    })
}

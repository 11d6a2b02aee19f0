//! Slack request signature verification.
//!
//! Slack signs each Events API delivery with an HMAC-SHA256 over
//! `"v0:<timestamp>:<raw body>"` keyed by the app's signing secret, and
//! sends the result as `X-Slack-Signature: v0=<hex digest>`. The HMAC
//! proves authenticity; the separate timestamp freshness check bounds how
//! long a captured request stays replayable.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Slack signature version prefix.
pub const SIGNATURE_VERSION: &str = "v0";

/// Compute the `v0=<hex>` signature for a timestamp and raw body.
#[must_use]
pub fn sign(signing_secret: &str, timestamp: &str, body: &[u8]) -> String {
    let base = format!(
        "{SIGNATURE_VERSION}:{timestamp}:{}",
        String::from_utf8_lossy(body)
    );
    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        // HMAC accepts keys of any length; new_from_slice cannot fail.
        return String::new();
    };
    mac.update(base.as_bytes());
    format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Verify a supplied signature header against the raw request body.
///
/// The supplied digest is hex-decoded and compared in constant time via
/// [`Mac::verify_slice`]. A missing `v0=` prefix, non-hex digest, or
/// mismatched MAC all return `false`.
#[must_use]
pub fn verify(signing_secret: &str, timestamp: &str, signature: &str, body: &[u8]) -> bool {
    let Some(hex_digest) = signature.strip_prefix("v0=") else {
        return false;
    };
    let Ok(supplied) = hex::decode(hex_digest) else {
        return false;
    };
    let base = format!(
        "{SIGNATURE_VERSION}:{timestamp}:{}",
        String::from_utf8_lossy(body)
    );
    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return false;
    };
    mac.update(base.as_bytes());
    mac.verify_slice(&supplied).is_ok()
}

/// Check that a signature timestamp is within `tolerance_seconds` of `now`.
///
/// Non-numeric timestamps fail the check.
#[must_use]
pub fn timestamp_fresh(timestamp: &str, now: i64, tolerance_seconds: i64) -> bool {
    match timestamp.parse::<i64>() {
        Ok(ts) => (now - ts).abs() <= tolerance_seconds,
        Err(_) => false,
    }
}

//! Generated image persistence in S3, exposed through a CDN domain.

use std::future::Future;
use std::pin::Pin;

use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;
use uuid::Uuid;

use crate::{AppError, Result};

/// Fixed key prefix for generated images.
pub const IMAGE_PREFIX: &str = "images/";

/// Port for the image object store.
pub trait ImageStore: Send + Sync {
    /// Persist PNG bytes under a fresh key and return the public URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) on upload
    /// failure.
    fn store_png(&self, data: Vec<u8>)
        -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// S3 implementation of [`ImageStore`].
///
/// Objects are write-once and never deleted here; the public URL goes
/// through the CDN domain, not the bucket endpoint.
pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    cdn_domain: String,
}

impl S3ImageStore {
    /// Create a store writing to `bucket` behind `cdn_domain`.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, bucket: String, cdn_domain: String) -> Self {
        Self {
            client,
            bucket,
            cdn_domain,
        }
    }

    async fn store_inner(&self, data: Vec<u8>) -> Result<String> {
        let key = format!("{IMAGE_PREFIX}{}.png", Uuid::new_v4());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type("image/png")
            .send()
            .await
            .map_err(|err| {
                AppError::Storage(format!(
                    "put_object {bucket}/{key}: {err}",
                    bucket = self.bucket
                ))
            })?;

        debug!(key, "image uploaded");
        Ok(format!("https://{}/{key}", self.cdn_domain))
    }
}

impl ImageStore for S3ImageStore {
    fn store_png(
        &self,
        data: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move { self.store_inner(data).await })
    }
}

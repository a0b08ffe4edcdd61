//! S3 presigned-URL locator signer.

use std::time::Duration;

use async_trait::async_trait;

use reel_models::OutputRef;
use reel_storage::S3Client;

use crate::collaborators::LocatorSigner;
use crate::error::{WorkerError, WorkerResult};

/// Signs clip output keys as presigned S3 GET URLs.
#[derive(Clone)]
pub struct S3LocatorSigner {
    client: S3Client,
    expires_in: Duration,
}

impl S3LocatorSigner {
    pub fn new(client: S3Client, expires_in: Duration) -> Self {
        Self { client, expires_in }
    }
}

#[async_trait]
impl LocatorSigner for S3LocatorSigner {
    async fn sign(&self, output: &OutputRef) -> WorkerResult<String> {
        self.client
            .presign_get(&output.key, self.expires_in)
            .await
            .map_err(|e| WorkerError::signing_failed(e.to_string()))
    }
}

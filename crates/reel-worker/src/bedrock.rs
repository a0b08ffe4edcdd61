//! Bedrock async-invoke render gateway (Nova Reel).
//!
//! Clips are rendered straight into the output bucket under
//! `{prefix}{invocation_id}/output.mp4`, where the invocation id is the
//! last path segment of the invocation ARN.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_bedrockruntime::config::{Builder, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    AsyncInvokeOutputDataConfig, AsyncInvokeS3OutputDataConfig, AsyncInvokeStatus,
};
use aws_sdk_bedrockruntime::Client;
use aws_smithy_types::{Document, Number};
use serde_json::{json, Value};
use tracing::{debug, info};

use reel_models::{ClipHandle, OutputRef, RenderConfig, RenderStatus};

use crate::collaborators::RenderGateway;
use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_RENDER_MODEL_ID: &str = "amazon.nova-reel-v1:0";
pub const DEFAULT_OUTPUT_PREFIX: &str = "jobs/";

/// Bedrock render gateway configuration.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub model_id: String,
    /// Bucket the service writes clips into
    pub output_bucket: String,
    /// Key prefix under the bucket, always ending in `/` when non-empty
    pub output_prefix: String,
}

impl BedrockConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let required = |key: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| WorkerError::config_error(format!("{} not set", key)))
        };

        Ok(Self {
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            model_id: std::env::var("RENDER_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_RENDER_MODEL_ID.to_string()),
            output_bucket: required("S3_BUCKET_NAME")?,
            output_prefix: normalize_prefix(
                &std::env::var("RENDER_OUTPUT_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_OUTPUT_PREFIX.to_string()),
            ),
        })
    }

    /// `s3://bucket/prefix` the service writes into.
    pub fn output_uri(&self) -> String {
        format!("s3://{}/{}", self.output_bucket, self.output_prefix)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Last `/` segment of an invocation ARN.
pub fn invocation_id(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// Nova Reel `TEXT_VIDEO` model input.
pub fn model_input(prompt: &str, config: &RenderConfig) -> Value {
    json!({
        "taskType": "TEXT_VIDEO",
        "textToVideoParams": { "text": prompt },
        "videoGenerationConfig": {
            "durationSeconds": config.duration_seconds,
            "fps": config.fps,
            "dimension": config.dimension(),
            "seed": config.seed,
        },
    })
}

fn to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// Render gateway backed by Bedrock async invoke.
#[derive(Clone)]
pub struct BedrockRenderGateway {
    client: Client,
    config: BedrockConfig,
}

impl BedrockRenderGateway {
    pub fn new(config: BedrockConfig) -> WorkerResult<Self> {
        if config.output_bucket.trim().is_empty() {
            return Err(WorkerError::config_error("output bucket is empty"));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "scriptreel",
        );
        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .build();

        info!(
            "Render gateway using model {} writing to {}",
            config.model_id,
            config.output_uri()
        );
        Ok(Self {
            client: Client::from_conf(sdk_config),
            config,
        })
    }

    fn output_ref(&self, arn: &str) -> OutputRef {
        OutputRef::new(format!(
            "{}{}/output.mp4",
            self.config.output_prefix,
            invocation_id(arn)
        ))
    }
}

#[async_trait]
impl RenderGateway for BedrockRenderGateway {
    async fn submit(&self, prompt: &str, config: &RenderConfig) -> WorkerResult<ClipHandle> {
        let output = AsyncInvokeS3OutputDataConfig::builder()
            .s3_uri(self.config.output_uri())
            .build()
            .map_err(|e| WorkerError::render_failed(format!("Invalid output config: {}", e)))?;

        let response = self
            .client
            .start_async_invoke()
            .model_id(&self.config.model_id)
            .model_input(to_document(&model_input(prompt, config)))
            .output_data_config(AsyncInvokeOutputDataConfig::S3OutputDataConfig(output))
            .send()
            .await
            .map_err(|e| {
                WorkerError::render_failed(format!(
                    "StartAsyncInvoke failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!("Started async invoke {}", response.invocation_arn());
        Ok(ClipHandle::new(response.invocation_arn()))
    }

    async fn poll(&self, handle: &ClipHandle) -> WorkerResult<RenderStatus> {
        let response = self
            .client
            .get_async_invoke()
            .invocation_arn(handle.as_str())
            .send()
            .await
            .map_err(|e| {
                WorkerError::render_failed(format!(
                    "GetAsyncInvoke failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let status = match response.status() {
            AsyncInvokeStatus::Completed => RenderStatus::Completed {
                output: self.output_ref(handle.as_str()),
            },
            AsyncInvokeStatus::Failed => RenderStatus::Failed {
                reason: response
                    .failure_message()
                    .unwrap_or("Unknown failure.")
                    .to_string(),
            },
            other => RenderStatus::InProgress {
                detail: other.as_str().to_string(),
            },
        };
        Ok(status)
    }
}

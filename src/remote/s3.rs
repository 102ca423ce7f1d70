//! S3-backed object store.
//!
//! Wraps `aws-sdk-s3`. Works against AWS itself (default credential chain)
//! or any S3-compatible endpoint such as MinIO when `endpoint` and static
//! keys are configured.

use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::debug;

/// Region that rejects an explicit location constraint on bucket creation.
const DEFAULT_REGION: &str = "us-east-1";

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    /// Build a client for `bucket` in `region`.
    ///
    /// With `endpoint` set, requests use path-style addressing. Static
    /// `credentials` (access key, secret key) replace the default provider
    /// chain when given.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint: Option<String>,
        credentials: Option<(String, String)>,
    ) -> Self {
        let mut builder =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));

        if let Some((access_key, secret_key)) = credentials {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "letterbox-config",
            ));
        }
        if let Some(ref ep) = endpoint {
            builder = builder.endpoint_url(ep.trim_end_matches('/'));
        }

        let aws_config = builder.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(endpoint.is_some())
            .build();

        S3ObjectStore {
            client: Client::from_conf(s3_config),
            bucket,
            region,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(crate::imaging::OUTPUT_CONTENT_TYPE)
            .body(bytes.into())
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("put {key}: {}", DisplayErrorContext(&e))))?;
        debug!(key, bucket = %self.bucket, "uploaded object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::Request(format!(
                    "get {key}: {}",
                    DisplayErrorContext(&e)
                )));
            }
        };

        let bytes = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Body(format!("read body for {key}: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(Some(bytes))
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool, StoreError> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("list buckets: {}", DisplayErrorContext(&e))))?;

        Ok(resp.buckets().iter().any(|b| b.name() == Some(name)))
    }

    async fn create_bucket(&self, name: &str) -> Result<(), StoreError> {
        let mut req = self.client.create_bucket().bucket(name);
        if self.region != DEFAULT_REGION {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        req.send().await.map_err(|e| {
            StoreError::Request(format!("create bucket {name}: {}", DisplayErrorContext(&e)))
        })?;
        Ok(())
    }
}

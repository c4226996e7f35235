use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::{Arc, Mutex};

/// StorageError
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload to {bucket}/{path} failed: {message}")]
    Upload {
        bucket: String,
        path: String,
        message: String,
    },
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for the blob storage backend that holds every uploaded content
/// image. Handlers only see this trait, so the S3 client can be replaced with the
/// in-memory mock during testing.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the given bucket exists. Used by the `Env::Local` setup to provision
    /// MinIO buckets at startup.
    async fn ensure_bucket_exists(&self, bucket: &str);

    /// Stores `bytes` at `path` inside `bucket`, overwriting any previous object.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// The stable public URL an uploaded object is served from.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

// 2. The Real Implementation (S3/MinIO/Supabase)
/// S3StorageClient
///
/// Uses the AWS SDK for S3. Through S3 compatibility this talks to:
/// - **Local:** Dockerized MinIO instance.
/// - **Production:** Supabase Storage S3 gateway.
///
/// `force_path_style(true)` is required by both MinIO and Supabase.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    public_base_url: String,
}

impl S3StorageClient {
    /// Constructs the S3 client from the values resolved by `AppConfig`.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent; an "already owned" error is ignored.
    async fn ensure_bucket_exists(&self, bucket: &str) {
        if let Err(e) = self.client.create_bucket().bucket(bucket).send().await {
            tracing::debug!(bucket, "create_bucket: {:?}", e);
        }
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .content_type(content_type)
            .cache_control("max-age=3600")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, sanitize_key(path))
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a
/// user-provided key so an upload can never escape its bucket prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// object_name
///
/// Storage path for an uploaded file: `<unix-millis>_<file name>`. Directory parts
/// of the client-supplied name are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
pub fn object_name(millis: i64, file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        format!("{}_upload", millis)
    } else {
        format!("{}_{}", millis, cleaned)
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Records every upload in memory instead of talking to S3, and can be told to
/// fail so the handlers' error paths can be exercised.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all uploads return a simulated failure.
    pub should_fail: bool,
    uploads: Arc<Mutex<Vec<StoredObject>>>,
}

/// An upload captured by `MockStorageService`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the uploads received so far.
    pub fn uploads(&self) -> Vec<StoredObject> {
        self.uploads
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self, _bucket: &str) {
        // No-op in mock environment.
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Upload {
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: "Mock Storage Error: Simulation requested".to_string(),
            });
        }

        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(StoredObject {
                bucket: bucket.to_string(),
                path: sanitize_key(path),
                content_type: content_type.to_string(),
                size: bytes.len(),
            });
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("http://localhost:9000/{}/{}", bucket, sanitize_key(path))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_cannot_climb_out_of_the_bucket() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("/a//b/./c"), "a/b/c");
    }

    #[test]
    fn object_names_are_timestamped_and_cleaned() {
        assert_eq!(object_name(1700, "photo.png"), "1700_photo.png");
        assert_eq!(object_name(1700, "C:\\Users\\me\\My Photo.jpg"), "1700_My_Photo.jpg");
        assert_eq!(object_name(1700, "../.."), "1700_upload");
    }

    #[tokio::test]
    async fn mock_records_uploads_and_builds_urls() {
        let storage = MockStorageService::new();
        storage
            .upload("news", "1_a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(storage.uploads()[0].size, 3);
        assert_eq!(
            storage.public_url("news", "1_a.png"),
            "http://localhost:9000/news/1_a.png"
        );
        assert!(MockStorageService::new_failing()
            .upload("news", "x", vec![], "image/png")
            .await
            .is_err());
    }
}

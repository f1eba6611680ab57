//! Upload of the merged file to S3-compatible object storage

use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, ObjectStoreExt, WriteMultipart};
use tokio::io::AsyncReadExt;

use crate::core::config::StorageConfig;
use crate::core::error::{Error, Result};

/// Size of each multipart chunk sent to the store
pub const UPLOAD_PART_SIZE: usize = 8 * 1024 * 1024;

const MAX_CONCURRENT_PARTS: usize = 4;
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Builds an object store client scoped to one storage configuration
pub trait StorageConnector: Send + Sync {
    fn connect(&self, config: &StorageConfig) -> Result<Arc<dyn ObjectStore>>;
}

/// Connects to S3, Cloudflare R2, MinIO and other S3-compatible endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Connector;

impl StorageConnector for S3Connector {
    fn connect(&self, config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
        if config.endpoint_url.is_empty() {
            return Err(Error::InvalidConfig(
                "S3 endpoint is not set (S3_ENDPOINT_URL or S3_ACCOUNT_ID)".to_string(),
            ));
        }
        if config.bucket_name.is_empty() {
            return Err(Error::InvalidConfig("S3_BUCKET_NAME is not set".to_string()));
        }

        let store = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket_name)
            .with_endpoint(&config.endpoint_url)
            .with_allow_http(config.endpoint_url.starts_with("http://"))
            .with_region(&config.region)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.access_key_secret)
            .build()?;

        Ok(Arc::new(store))
    }
}

/// Object key for a local file: its base name
pub fn object_key(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("{} has no usable file name", path.display())))
}

/// Pushes files to object storage, reporting success as a boolean
pub struct Uploader<C> {
    connector: C,
}

impl<C: StorageConnector> Uploader<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Upload `file` under its base name. Errors are logged and reported as `false`.
    pub async fn upload(&self, file: &Path, config: &StorageConfig) -> bool {
        info!("Initiating upload to {}", config.endpoint_url);

        match self.try_upload(file, config).await {
            Ok((key, bytes)) => {
                info!(
                    "Successfully uploaded {} to {}/{key} ({bytes} bytes)",
                    file.display(),
                    config.bucket_name
                );
                true
            }
            Err(e) => {
                error!("Failed to upload {}: {e}", file.display());
                false
            }
        }
    }

    async fn try_upload(&self, file: &Path, config: &StorageConfig) -> Result<(String, u64)> {
        let key = object_key(file)?;
        let store = self.connector.connect(config)?;
        let mut source = tokio::fs::File::open(file).await?;

        let upload = store.put_multipart(&ObjectPath::from(key.as_str())).await?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, UPLOAD_PART_SIZE);

        let bytes = match stream_parts(&mut source, &mut writer).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(abort) = writer.abort().await {
                    error!("Failed to abort multipart upload of {key}: {abort}");
                }
                return Err(e);
            }
        };

        writer.finish().await?;
        Ok((key, bytes))
    }
}

async fn stream_parts(source: &mut tokio::fs::File, writer: &mut WriteMultipart) -> Result<u64> {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = source.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }

        writer.wait_for_capacity(MAX_CONCURRENT_PARTS).await?;
        writer.write(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok(total)
}

// thumbnailer/src/store/object.rs
use crate::core::{ObjectStoreConfig, Result, ThumbnailError};
use crate::processors::codec::{self, ImageKind};
use crate::utils::decoded_path;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use tokio::runtime::Runtime;
use url::Url;

/// Shared S3 client and the runtime that drives its requests.
///
/// Store operations are blocking: each worker thread waits on its own
/// request, so they must not be called from inside an async context.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    client: Client,
    runtime: Arc<Runtime>,
}

impl ObjectStorage {
    pub fn connect(config: &ObjectStoreConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("thumbnailer-s3")
            .build()
            .map_err(|e| {
                ThumbnailError::ProcessingError(format!(
                    "Failed to start object storage runtime: {}",
                    e
                ))
            })?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }
        let sdk_config = runtime.block_on(loader.load());

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        log::info!(
            "Object storage client ready (region: {}, endpoint: {})",
            config.region,
            config.endpoint.as_deref().unwrap_or("default")
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            runtime: Arc::new(runtime),
        })
    }
}

/// Bucket and key addressed by an `s3://bucket/key` location.
pub fn object_address(url: &Url) -> Result<(String, String)> {
    let bucket = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ThumbnailError::InvalidParameter(format!("{} names no bucket", url)))?;

    let key = decoded_path(url).trim_start_matches('/').to_string();
    if key.is_empty() {
        return Err(ThumbnailError::InvalidParameter(format!(
            "{} names no object key",
            url
        )));
    }

    Ok((bucket.to_string(), key))
}

/// S3 backend bound to one object.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    url: Url,
    bucket: String,
    key: String,
    storage: ObjectStorage,
}

impl ObjectStore {
    pub fn new(url: Url, storage: ObjectStorage) -> Result<Self> {
        let (bucket, key) = object_address(&url)?;
        Ok(Self {
            url,
            bucket,
            key,
            storage,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn open(&self) -> Result<DynamicImage> {
        log::debug!("Downloading s3://{}/{}", self.bucket, self.key);

        let kind = ImageKind::from_path(&self.key)?;
        let data = self.storage.runtime.block_on(async {
            let response = self
                .storage
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&self.key)
                .send()
                .await
                .map_err(|e| self.storage_error(e))?;

            let body = response
                .body
                .collect()
                .await
                .map_err(|e| self.storage_error(e))?;

            Ok::<_, ThumbnailError>(body.into_bytes())
        })?;

        codec::decode(&data, kind)
    }

    /// Uploads with public-read visibility and a content type taken from the
    /// key's extension.
    pub fn save(&self, image: &RgbaImage) -> Result<()> {
        let kind = ImageKind::from_path(&self.key)?;
        let data = codec::encode(image, kind)?;
        let size = data.len();

        let request = self
            .storage
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type(kind.mime_type())
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(data))
            .send();

        self.storage
            .runtime
            .block_on(request)
            .map_err(|e| self.storage_error(e))?;

        log::info!("Uploaded image: {} ({} bytes)", self.url, size);
        Ok(())
    }

    fn storage_error<E: std::error::Error>(&self, e: E) -> ThumbnailError {
        let message = DisplayErrorContext(e).to_string();
        log::warn!("Object storage request for {} failed: {}", self.url, message);
        ThumbnailError::ObjectStore {
            location: self.url.to_string(),
            message,
        }
    }
}

// thumbnailer/src/core/mod.rs
pub mod job;
pub mod thumbnailer;

use thiserror::Error;

pub use job::{Job, JobReport, Rect, ThumbnailOpt, ThumbnailResult};
pub use thumbnailer::{JobStage, Thumbnailer};

/// Upper bound for `ThumbnailerConfig::max_workers`.
pub const MAX_WORKERS: usize = 256;

/// Largest width or height a thumbnail may be resized to.
pub const MAX_DIMENSION: u32 = 100_000;

/// Largest pixel count of a resized thumbnail (1 GiB of RGBA).
pub const MAX_PIXELS: u64 = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    /// Catmull-Rom.
    #[default]
    Bicubic,
    Lanczos3,
}

/// File name used for options that neither crop nor resize.
///
/// Historically these outputs were named after the bare source stem, with no
/// extension at all, which the local backend then refuses to encode. The
/// legacy behavior stays the default; the other variants opt into a usable
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassthroughNaming {
    /// `{base}`
    #[default]
    BareStem,
    /// `{base}{ext}`
    KeepExtension,
    /// `{base}_s{width}x{height}{ext}`
    Sized,
}

/// Connection settings for the `s3://` backend. Credentials come from the
/// default AWS provider chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStoreConfig {
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, localstack).
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            force_path_style: false,
        }
    }
}

impl ObjectStoreConfig {
    /// Reads `AWS_REGION`, `THUMBNAILER_S3_ENDPOINT` and
    /// `THUMBNAILER_S3_PATH_STYLE`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            region: std::env::var("AWS_REGION").unwrap_or(defaults.region),
            endpoint: std::env::var("THUMBNAILER_S3_ENDPOINT")
                .ok()
                .filter(|e| !e.is_empty()),
            force_path_style: std::env::var("THUMBNAILER_S3_PATH_STYLE")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(defaults.force_path_style),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailerConfig {
    /// Worker threads for option fan-out. 0 uses the global rayon pool.
    pub max_workers: usize,
    pub algorithm: ResizeAlgorithm,
    /// Resize the source once to the largest requested box and derive the
    /// other crop-free thumbnails from that intermediate.
    pub shared_pre_resize: bool,
    pub passthrough_naming: PassthroughNaming,
    /// `None` leaves `s3://` locations unresolvable.
    pub object_storage: Option<ObjectStoreConfig>,
}

impl Default for ThumbnailerConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            algorithm: ResizeAlgorithm::Bicubic,
            shared_pre_resize: true,
            passthrough_naming: PassthroughNaming::BareStem,
            object_storage: None,
        }
    }
}

impl ThumbnailerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_workers > MAX_WORKERS {
            return Err(ThumbnailError::InvalidParameter(format!(
                "max_workers must be at most {} (got {})",
                MAX_WORKERS, self.max_workers
            )));
        }

        if let Some(object) = &self.object_storage {
            if object.region.trim().is_empty() {
                return Err(ThumbnailError::InvalidParameter(
                    "Object storage region must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("IO error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object storage error on {location}: {message}")]
    ObjectStore { location: String, message: String },

    #[error("Invalid location {input:?}: {source}")]
    InvalidLocation {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Delete is not supported for {0}")]
    DeleteUnsupported(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl ThumbnailError {
    pub(crate) fn io(location: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            location: location.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;

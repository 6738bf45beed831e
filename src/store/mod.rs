// thumbnailer/src/store/mod.rs
//! Image storage backends, selected by location scheme.
//!
//! | Scheme | Backend | Location |
//! |---|---|---|
//! | `file` | [`FileStore`] | URI path is the local path |
//! | `s3` | [`ObjectStore`] | host is the bucket, path is the key |
//!
//! Adding a backend means one more [`ImageStore`] variant and one more arm in
//! [`StoreContext::resolve`].

mod fs;
mod object;

pub use fs::FileStore;
pub use object::{object_address, ObjectStorage, ObjectStore};

use crate::core::{ObjectStoreConfig, Result, ThumbnailError};
use image::{DynamicImage, RgbaImage};
use url::Url;

pub const FILE_SCHEME: &str = "file";
pub const OBJECT_SCHEME: &str = "s3";

pub fn parse_location(input: &str) -> Result<Url> {
    Url::parse(input).map_err(|source| ThumbnailError::InvalidLocation {
        input: input.to_string(),
        source,
    })
}

/// A backend bound to a single location.
#[derive(Debug)]
pub enum ImageStore {
    File(FileStore),
    Object(ObjectStore),
}

impl ImageStore {
    pub fn url(&self) -> &Url {
        match self {
            Self::File(store) => store.url(),
            Self::Object(store) => store.url(),
        }
    }

    pub fn open(&self) -> Result<DynamicImage> {
        match self {
            Self::File(store) => store.open(),
            Self::Object(store) => store.open(),
        }
    }

    pub fn save(&self, image: &RgbaImage) -> Result<()> {
        match self {
            Self::File(store) => store.save(image),
            Self::Object(store) => store.save(image),
        }
    }

    /// Only local files can be deleted.
    pub fn delete(&self) -> Result<()> {
        match self {
            Self::File(store) => store.delete(),
            Self::Object(store) => Err(ThumbnailError::DeleteUnsupported(store.url().to_string())),
        }
    }
}

/// Everything a backend needs beyond the location itself.
#[derive(Clone, Default)]
pub struct StoreContext {
    object: Option<ObjectStorage>,
}

impl StoreContext {
    /// Local files only; `s3://` locations fail to resolve.
    pub fn local() -> Self {
        Self::default()
    }

    pub fn with_object_storage(storage: ObjectStorage) -> Self {
        Self {
            object: Some(storage),
        }
    }

    pub fn from_config(config: Option<&ObjectStoreConfig>) -> Result<Self> {
        match config {
            Some(config) => Ok(Self::with_object_storage(ObjectStorage::connect(config)?)),
            None => Ok(Self::local()),
        }
    }

    pub fn resolve(&self, url: &Url) -> Result<ImageStore> {
        match url.scheme() {
            FILE_SCHEME => Ok(ImageStore::File(FileStore::new(url.clone())?)),
            OBJECT_SCHEME => {
                let storage = self.object.clone().ok_or_else(|| ThumbnailError::ObjectStore {
                    location: url.to_string(),
                    message: "object storage is not configured".to_string(),
                })?;
                Ok(ImageStore::Object(ObjectStore::new(url.clone(), storage)?))
            }
            _ => Err(ThumbnailError::UnsupportedScheme(url.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_scheme_resolves_locally() {
        let url = parse_location("file:///tmp/cat.jpg").unwrap();
        let store = StoreContext::local().resolve(&url).unwrap();
        assert!(matches!(store, ImageStore::File(_)));
        assert_eq!(store.url(), &url);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let url = parse_location("ftp://example.com/cat.jpg").unwrap();
        let result = StoreContext::local().resolve(&url);
        assert!(
            matches!(result, Err(ThumbnailError::UnsupportedScheme(ref u)) if u == "ftp://example.com/cat.jpg")
        );
    }

    #[test]
    fn object_scheme_needs_configuration() {
        let url = parse_location("s3://bucket/cat.jpg").unwrap();
        let context = StoreContext::local();
        assert!(matches!(
            context.resolve(&url),
            Err(ThumbnailError::ObjectStore { .. })
        ));
    }

    #[test]
    fn malformed_location() {
        assert!(matches!(
            parse_location("::not a location"),
            Err(ThumbnailError::InvalidLocation { .. })
        ));
    }
}

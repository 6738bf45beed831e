// thumbnailer/src/store/fs.rs
use crate::core::{Result, ThumbnailError};
use crate::processors::codec::{self, ImageKind};
use image::{DynamicImage, RgbaImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;

/// Mode of saved files: owner read-write, world readable.
#[cfg(unix)]
pub const OUTPUT_MODE: u32 = 0o644;

/// Local filesystem backend.
#[derive(Debug, Clone)]
pub struct FileStore {
    url: Url,
    path: PathBuf,
}

impl FileStore {
    pub fn new(url: Url) -> Result<Self> {
        let path = url.to_file_path().map_err(|_| {
            ThumbnailError::InvalidParameter(format!("{} is not a local file path", url))
        })?;
        Ok(Self { url, path })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn open(&self) -> Result<DynamicImage> {
        log::debug!("Loading image from: {}", self.path.display());

        let kind = ImageKind::from_path(&self.path.to_string_lossy())?;
        let data = std::fs::read(&self.path).map_err(|e| ThumbnailError::io(self.path.display(), e))?;
        codec::decode(&data, kind)
    }

    /// Encodes in memory, then swaps the file into place so that a failed
    /// save never leaves a partial image behind.
    pub fn save(&self, image: &RgbaImage) -> Result<()> {
        let kind = ImageKind::from_path(&self.path.to_string_lossy())?;
        let data = codec::encode(image, kind)?;

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| ThumbnailError::io(parent.display(), e))?;

        let mut temp_file =
            NamedTempFile::new_in(parent).map_err(|e| ThumbnailError::io(parent.display(), e))?;
        temp_file
            .write_all(&data)
            .map_err(|e| ThumbnailError::io(temp_file.path().display(), e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp_file
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(OUTPUT_MODE))
                .map_err(|e| ThumbnailError::io(temp_file.path().display(), e))?;
        }
        temp_file
            .persist(&self.path)
            .map_err(|e| ThumbnailError::io(self.path.display(), e.error))?;

        log::info!("Saved image: {} ({} bytes)", self.path.display(), data.len());
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|e| ThumbnailError::io(self.path.display(), e))?;
        log::info!("Deleted {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    fn store_at(path: &Path) -> FileStore {
        FileStore::new(Url::from_file_path(path).unwrap()).unwrap()
    }

    #[test]
    fn save_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir.path().join("nested/out.png"));
        let image = RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 255]));

        store.save(&image).unwrap();
        let reopened = store.open().unwrap();

        assert_eq!(reopened.dimensions(), (6, 4));
        assert_eq!(reopened.into_rgba8(), image);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.png");
        store_at(&path).save(&RgbaImage::new(3, 3)).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, OUTPUT_MODE);
    }

    #[test]
    fn unsupported_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webp");
        let store = store_at(&path);

        let result = store.save(&RgbaImage::new(2, 2));

        assert!(matches!(result, Err(ThumbnailError::UnsupportedFormat(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir.path().join("missing.jpg"));
        assert!(matches!(store.open(), Err(ThumbnailError::Io { .. })));
    }

    #[test]
    fn open_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(store_at(&path).open(), Err(ThumbnailError::Decode(_))));
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.bmp");
        std::fs::write(&path, b"x").unwrap();

        store_at(&path).delete().unwrap();
        assert!(!path.exists());
        assert!(matches!(store_at(&path).delete(), Err(ThumbnailError::Io { .. })));
    }
}

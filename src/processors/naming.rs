// thumbnailer/src/processors/naming.rs
//! Output locations for generated thumbnails.
//!
//! An explicit `dstImage` always wins. Otherwise the name is built from the
//! source file name inside `dstFolder`:
//!
//! | Option | File name |
//! |---|---|
//! | crop | `{base}_c{minX}-{minY}-{maxX}-{maxY}_s{w}x{h}{ext}` |
//! | no crop, no resize | see [`PassthroughNaming`] |
//! | resize | `{base}_s{w}x{h}{ext}` |
//!
//! `w` and `h` are the dimensions actually produced, and `ext` is the source
//! extension lower-cased.

use crate::core::{Job, PassthroughNaming, Result, ThumbnailError, ThumbnailOpt};
use crate::store::parse_location;
use crate::utils::{decoded_path, split_file_name};
use url::Url;

/// Source file name split into the parts every generated name reuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub base: String,
    /// Lower-cased, dot included, empty when the source has none.
    pub extension: String,
}

impl SourceName {
    pub fn from_url(url: &Url) -> Self {
        let path = decoded_path(url);
        let (base, extension) = split_file_name(&path);
        Self {
            base: base.to_string(),
            extension: extension.to_lowercase(),
        }
    }
}

pub fn thumbnail_file_name(
    source: &SourceName,
    opt: &ThumbnailOpt,
    output: (u32, u32),
    passthrough: PassthroughNaming,
) -> String {
    let SourceName { base, extension } = source;
    let (width, height) = output;

    if let Some(rect) = &opt.rect {
        return format!(
            "{}_c{}-{}-{}-{}_s{}x{}{}",
            base, rect.min[0], rect.min[1], rect.max[0], rect.max[1], width, height, extension
        );
    }

    if opt.is_passthrough() {
        return match passthrough {
            PassthroughNaming::BareStem => base.clone(),
            PassthroughNaming::KeepExtension => format!("{}{}", base, extension),
            PassthroughNaming::Sized => format!("{}_s{}x{}{}", base, width, height, extension),
        };
    }

    format!("{}_s{}x{}{}", base, width, height, extension)
}

/// Where the thumbnail for `opt` goes, given the dimensions it came out with.
pub fn thumbnail_url(
    job: &Job,
    opt: &ThumbnailOpt,
    output: (u32, u32),
    passthrough: PassthroughNaming,
) -> Result<Url> {
    if let Some(destination) = opt.explicit_destination() {
        return parse_location(destination);
    }

    let source = parse_location(&job.src_image)?;
    let mut folder = parse_location(&job.dst_folder)?;
    let name = thumbnail_file_name(&SourceName::from_url(&source), opt, output, passthrough);

    if folder.cannot_be_a_base() {
        return Err(ThumbnailError::InvalidParameter(format!(
            "Destination folder {} cannot hold files",
            folder
        )));
    }

    let joined = format!("{}/{}", folder.path().trim_end_matches('/'), name);
    folder.set_path(&joined);
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rect;

    fn cat_job() -> Job {
        Job::new("file:///home/me/pictures/cat.jpg", "file:///tmp")
    }

    #[test]
    fn sized_name() {
        let opt = ThumbnailOpt::sized(100, 100);
        let url = thumbnail_url(&cat_job(), &opt, (100, 100), PassthroughNaming::default()).unwrap();
        assert_eq!(url.path(), "/tmp/cat_s100x100.jpg");
        assert_eq!(url.scheme(), "file");
    }

    #[test]
    fn cropped_name() {
        let opt = ThumbnailOpt::cropped(Rect::new(10, 10, 50, 50), 20, 20);
        let url = thumbnail_url(&cat_job(), &opt, (20, 20), PassthroughNaming::default()).unwrap();
        assert_eq!(url.path(), "/tmp/cat_c10-10-50-50_s20x20.jpg");
    }

    #[test]
    fn resolved_dimensions_replace_zeros() {
        let opt = ThumbnailOpt::sized(0, 240);
        let url = thumbnail_url(&cat_job(), &opt, (320, 240), PassthroughNaming::default()).unwrap();
        assert_eq!(url.path(), "/tmp/cat_s320x240.jpg");
    }

    #[test]
    fn extension_is_lower_cased() {
        let job = Job::new("s3://src/Holiday.JPEG", "s3://thumbs/");
        let url = thumbnail_url(&job, &ThumbnailOpt::sized(10, 20), (10, 20), PassthroughNaming::default())
            .unwrap();
        assert_eq!(url.as_str(), "s3://thumbs/Holiday_s10x20.jpeg");
    }

    #[test]
    fn passthrough_bare_stem_drops_extension() {
        let opt = ThumbnailOpt::sized(0, 0);
        let url = thumbnail_url(&cat_job(), &opt, (640, 480), PassthroughNaming::BareStem).unwrap();
        assert_eq!(url.path(), "/tmp/cat");
    }

    #[test]
    fn passthrough_alternatives() {
        let opt = ThumbnailOpt::sized(0, 0);
        let keep = thumbnail_url(&cat_job(), &opt, (640, 480), PassthroughNaming::KeepExtension).unwrap();
        let sized = thumbnail_url(&cat_job(), &opt, (640, 480), PassthroughNaming::Sized).unwrap();
        assert_eq!(keep.path(), "/tmp/cat.jpg");
        assert_eq!(sized.path(), "/tmp/cat_s640x480.jpg");
    }

    #[test]
    fn explicit_destination_is_verbatim() {
        let opt = ThumbnailOpt::sized(10, 10).with_destination("s3://bucket/custom/Name.PNG");
        let url = thumbnail_url(&cat_job(), &opt, (10, 10), PassthroughNaming::default()).unwrap();
        assert_eq!(url.as_str(), "s3://bucket/custom/Name.PNG");
    }

    #[test]
    fn invalid_destination_folder() {
        let job = Job::new("file:///a/cat.jpg", "not a url");
        let result = thumbnail_url(&job, &ThumbnailOpt::sized(1, 1), (1, 1), PassthroughNaming::default());
        assert!(matches!(result, Err(ThumbnailError::InvalidLocation { .. })));
    }

    #[test]
    fn folder_without_trailing_path() {
        let job = Job::new("file:///a/cat.png", "s3://bucket");
        let url = thumbnail_url(&job, &ThumbnailOpt::sized(5, 5), (5, 5), PassthroughNaming::default()).unwrap();
        assert_eq!(url.as_str(), "s3://bucket/cat_s5x5.png");
    }

    #[test]
    fn names_with_spaces_survive() {
        let job = Job::new("file:///a/my%20cat.jpg", "file:///tmp/out%20dir/");
        let url = thumbnail_url(&job, &ThumbnailOpt::sized(5, 5), (5, 5), PassthroughNaming::default()).unwrap();
        assert_eq!(
            url.to_file_path().unwrap(),
            std::path::PathBuf::from("/tmp/out dir/my cat_s5x5.jpg")
        );
    }
}

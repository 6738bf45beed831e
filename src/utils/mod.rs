// thumbnailer/src/utils/mod.rs
use percent_encoding::percent_decode_str;
use url::Url;

/// Lower-cased extension of the last path segment, without the dot.
pub fn get_file_extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let dot = name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(name[dot + 1..].to_lowercase())
}

/// Percent-decoded path of a location.
pub fn decoded_path(url: &Url) -> String {
    percent_decode_str(url.path()).decode_utf8_lossy().into_owned()
}

/// Splits the last segment of `path` into its stem and its extension as
/// written (dot included, case preserved).
pub fn split_file_name(path: &str) -> (&str, &str) {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    }
}

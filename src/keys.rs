//! Object key naming.
//!
//! Uploaded sources carry an `-org` marker before their extension
//! (`videos/cat-org.mp4`); every variant replaces the marker and extension
//! with its own suffix (`videos/cat-xs.jpg`, `videos/cat-240p.mp4`). Keys
//! without the marker, or without an extension, get the suffix appended to
//! their stem, so a variant key never collides with its source.

use crate::variants::all_specs;

/// Marker that identifies an uploaded original.
pub const ORIGINAL_MARKER: &str = "-org";

/// Extensions accepted as video sources by [`has_original_marker`].
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mov", "avi", "mkv", "flv", "wmv", "webm"];

/// Split `key` into `(prefix, file name)` at the last `/`.
fn split_file_name(key: &str) -> (&str, &str) {
    match key.rfind('/') {
        Some(index) => key.split_at(index + 1),
        None => ("", key),
    }
}

/// Split a file name into `(stem, extension)`. Dot-files have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(index) if index > 0 => (&name[..index], Some(&name[index + 1..])),
        _ => (name, None),
    }
}

/// The key with its extension and `-org` marker removed.
///
/// ```
/// use clip_variants::keys::base_key;
///
/// assert_eq!(base_key("videos/cat-org.mp4"), "videos/cat");
/// assert_eq!(base_key("videos/cat.mov"), "videos/cat");
/// assert_eq!(base_key("videos/.hidden"), "videos/.hidden");
/// ```
pub fn base_key(source_key: &str) -> String {
    let (prefix, name) = split_file_name(source_key);
    let (stem, _) = split_extension(name);
    let stem = stem.strip_suffix(ORIGINAL_MARKER).unwrap_or(stem);
    format!("{prefix}{stem}")
}

/// Key a variant with `suffix` is uploaded under.
///
/// ```
/// use clip_variants::keys::derive_key;
///
/// assert_eq!(derive_key("videos/cat-org.mp4", "-xs.jpg"), "videos/cat-xs.jpg");
/// assert_eq!(derive_key("videos/cat-org.mp4", "-240p.mp4"), "videos/cat-240p.mp4");
/// ```
pub fn derive_key(source_key: &str, suffix: &str) -> String {
    format!("{}{suffix}", base_key(source_key))
}

/// File name portion of a key, used to name the local copy of the source.
pub fn file_name(key: &str) -> &str {
    split_file_name(key).1
}

/// File stem of a key without the `-org` marker, used to name scratch files.
pub fn scratch_stem(key: &str) -> String {
    file_name(&base_key(key)).to_string()
}

/// Returns `true` when `key` is one of the ten outputs this crate writes.
///
/// Variants are written back into the source bucket, so their creation
/// notifications must not be processed again.
pub fn is_derived_output(key: &str) -> bool {
    all_specs().any(|spec| key.ends_with(spec.suffix))
}

/// Returns `true` for `<stem>-org.<video extension>` keys.
pub fn has_original_marker(key: &str) -> bool {
    let (stem, extension) = split_extension(file_name(key));
    let Some(extension) = extension else {
        return false;
    };
    stem.ends_with(ORIGINAL_MARKER)
        && VIDEO_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
}

/// Why the object at `key` should not be processed, if it shouldn't.
///
/// Derived outputs are always skipped. With `originals_only`, so are keys
/// without the `-org` marker.
///
/// ```
/// use clip_variants::keys::skip_reason;
///
/// assert!(skip_reason("videos/cat-xs.jpg", false).is_some());
/// assert_eq!(skip_reason("videos/cat.mp4", true), Some("not an original file"));
/// assert_eq!(skip_reason("videos/cat-org.mp4", true), None);
/// ```
pub fn skip_reason(key: &str, originals_only: bool) -> Option<&'static str> {
    if is_derived_output(key) {
        Some("already a generated variant")
    } else if originals_only && !has_original_marker(key) {
        Some("not an original file")
    } else {
        None
    }
}

/// Decode a key as it appears in a storage notification.
///
/// Notification keys are form-encoded: spaces arrive as `+` and other
/// reserved characters as `%XX`. Invalid escapes leave the key unchanged.
pub fn decode_notification_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(error) => {
            log::warn!("Key {raw:?} is not valid percent-encoding ({error}); using it verbatim");
            spaced
        }
    }
}

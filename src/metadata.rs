//! Sidecar metadata loading and defensive field access.
//!
//! Every image may carry a JSON document next to it named after the full
//! file name plus `.json`:
//!
//! ```text
//! 1001/
//! ├── 88100_p0.jpg
//! ├── 88100_p0.jpg.json    # sidecar for 88100_p0.jpg
//! └── 88100_p1.jpg         # no sidecar: all fields default
//! ```
//!
//! ## Tolerance
//!
//! Sidecars are produced by assorted download tools and are not validated
//! beyond "is it a JSON object". A missing, unreadable, or malformed sidecar
//! is the same as no sidecar at all and never fails a scan. Every accessor
//! in this module returns `None` (or an empty value) for absent or
//! wrong-typed fields instead of erroring.
//!
//! ## Recognized fields
//!
//! | Field | Type | Used for |
//! |-------|------|----------|
//! | `id` | number (or numeric string) | numeric id, post grouping |
//! | `title`, `caption` | string | item text |
//! | `tags` | array of string | tag filter |
//! | `create_date`, `date` | ISO-8601 string | ordering |
//! | `total_bookmarks`, `total_view` | number | likes / views |
//! | `comments` | array of `{user:{name}, comment, date}` | comments |
//! | `user.*` and friends | strings | artist profile, see [`Extractor`] |
//!
//! ## Profile extraction
//!
//! Profile fields come from tools that disagree on key spelling. Each field
//! is an ordered list of [`Extractor`]s; the first one yielding a non-empty
//! string wins. The lists are constants so the fallback order is reviewable.

use crate::types::Comment;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A parsed sidecar document.
pub type RawMetadata = Map<String, Value>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sidecar is not a JSON object")]
    NotAnObject,
}

/// Path of the sidecar for an image: `photo.jpg` → `photo.jpg.json`.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    let mut name = image_path.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

/// Load and parse the sidecar for an image.
///
/// Returns `Ok(None)` when there is no sidecar. Errors describe why an
/// existing sidecar could not be used.
pub fn load_sidecar(image_path: &Path) -> Result<Option<RawMetadata>, MetadataError> {
    let path = sidecar_path(image_path);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path)?;
    let text = String::from_utf8_lossy(&bytes);
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(MetadataError::NotAnObject),
    }
}

/// Read the sidecar for an image, treating any failure as "no metadata".
pub fn read_sidecar(image_path: &Path) -> Option<RawMetadata> {
    match load_sidecar(image_path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(path = %image_path.display(), error = %e, "ignoring unusable sidecar");
            None
        }
    }
}

// =============================================================================
// Field access
// =============================================================================

/// Follow a dotted key path (`"user.name"`) through nested objects.
pub fn lookup<'a>(meta: &'a RawMetadata, path: &str) -> Option<&'a Value> {
    let mut keys = path.split('.');
    let mut current = meta.get(keys.next()?)?;
    for key in keys {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// A string field, only if it actually is a string.
pub fn string_field<'a>(meta: &'a RawMetadata, path: &str) -> Option<&'a str> {
    lookup(meta, path).and_then(Value::as_str)
}

/// A non-negative integer field. Floats, negatives and strings are ignored.
pub fn count_field(meta: &RawMetadata, path: &str) -> Option<u64> {
    lookup(meta, path).and_then(Value::as_u64)
}

/// The metadata `id` as a positive integer.
///
/// Accepts JSON numbers and numeric strings. Zero counts as absent.
pub fn id_field(meta: &RawMetadata) -> Option<u64> {
    let id = match meta.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|&n| n > 0)
}

/// The creation date string: `create_date`, else `date`.
pub fn create_date(meta: &RawMetadata) -> Option<String> {
    resolve(&[string_field(meta, "create_date"), string_field(meta, "date")])
}

/// Tag list. Numbers are stringified, other non-string entries dropped.
pub fn tags(meta: &RawMetadata) -> Vec<String> {
    let Some(Value::Array(values)) = meta.get("tags") else {
        return Vec::new();
    };
    values
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Comments normalized from `{user: {name}, comment, date}` objects.
pub fn comments(meta: &RawMetadata) -> Vec<Comment> {
    let Some(Value::Array(values)) = meta.get("comments") else {
        return Vec::new();
    };
    values
        .iter()
        .filter_map(Value::as_object)
        .map(|c| Comment {
            author: string_field(c, "user.name").map(String::from),
            text: string_field(c, "comment").map(String::from),
            date: string_field(c, "date").map(String::from),
        })
        .collect()
}

/// Parse an ISO-8601-ish date.
///
/// Accepts RFC 3339, date-times with an extended (`+09:00`) or basic
/// (`+0900`) offset and optional seconds, naive date-times (`T` or space
/// separated, optional fractional seconds, read as UTC; a trailing `Z` is
/// allowed), bare dates, and year-month (`2024-05`, read as the 1st).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = input.strip_suffix(['Z', 'z']).unwrap_or(input);
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{naive}-01"), "%Y-%m-%d"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Return the first non-empty value among sources, trimmed.
///
/// ```text
/// create_date: resolve(&[create_date, date])
/// profile:     resolve(&[extractor_1, extractor_2, ...])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

// =============================================================================
// Profile extractors
// =============================================================================

/// A named lookup of one string field at a dotted key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extractor(pub &'static str);

impl Extractor {
    pub fn apply<'a>(&self, meta: &'a RawMetadata) -> Option<&'a str> {
        string_field(meta, self.0)
    }

    #[cfg(test)]
    fn name(&self) -> &'static str {
        self.0
    }
}

/// Try extractors in order; first non-empty trimmed string wins.
pub fn extract(meta: &RawMetadata, extractors: &[Extractor]) -> Option<String> {
    let values: Vec<Option<&str>> = extractors.iter().map(|e| e.apply(meta)).collect();
    resolve(&values)
}

pub const ARTIST_NAME: &[Extractor] = &[
    Extractor("userName"),
    Extractor("user_name"),
    Extractor("artist_name"),
    Extractor("user.name"),
];

pub const ARTIST_USERNAME: &[Extractor] = &[
    Extractor("userAccount"),
    Extractor("user_account"),
    Extractor("account"),
    Extractor("user.account"),
    Extractor("user.username"),
];

pub const ARTIST_BIO: &[Extractor] = &[
    Extractor("userComment"),
    Extractor("user_comment"),
    Extractor("description"),
    Extractor("profile.comment"),
    Extractor("user.comment"),
];

pub const ARTIST_AVATAR: &[Extractor] = &[
    Extractor("user_profile_image_urls.medium"),
    Extractor("user_profile_image_urls.px_170x170"),
    Extractor("userProfileImageUrls.medium"),
    Extractor("userProfileImageUrls.px170x170"),
    Extractor("profile_image_urls.medium"),
    Extractor("profileImageUrls.medium"),
    Extractor("user.profile_image_urls.medium"),
    Extractor("user.profileImageUrls.medium"),
    Extractor("user.profile_image_url"),
    Extractor("user.profileImageUrl"),
];

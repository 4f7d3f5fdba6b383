//! Artist directory scanning.
//!
//! Lists the image files directly inside one artist directory and turns each
//! into an [`Item`]: sidecar metadata is read and normalized, the post/page
//! position is resolved, and a media reference is constructed.
//!
//! ```text
//! 1001/                      # artist id = directory name
//! ├── 88100_p0.jpg           # Item (post 88100, page 0)
//! ├── 88100_p0.jpg.json      # sidecar, not an item
//! ├── 88100_p1.PNG           # Item (extension match is case-insensitive)
//! ├── notes.txt              # ignored
//! └── extras/                # ignored: scanning is not recursive
//! ```
//!
//! Scanning is best-effort: a directory that is missing or unreadable yields
//! no items, and unreadable entries are skipped. Nothing here returns an
//! error to the caller.

use crate::config::MediaConfig;
use crate::grouping;
use crate::metadata::{self, RawMetadata};
use crate::types::{Item, sort_items};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Path;
use walkdir::WalkDir;

/// Scan one artist directory into items sorted in canonical order.
pub fn scan_artist(artist_id: &str, dir: &Path, media: &MediaConfig) -> Vec<Item> {
    let mut items: Vec<Item> = list_image_files(dir, media)
        .into_iter()
        .map(|file_name| {
            let meta = metadata::read_sidecar(&dir.join(&file_name)).unwrap_or_default();
            build_item(artist_id, &file_name, meta, media)
        })
        .collect();

    sort_items(&mut items);
    tracing::debug!(artist = artist_id, items = items.len(), "scanned artist");
    items
}

/// File names of recognized images directly inside `dir`, sorted by name.
fn list_image_files(dir: &Path, media: &MediaConfig) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match entry.file_name().to_str() {
            Some(name) => Some(name.to_string()),
            None => {
                tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 file name");
                None
            }
        })
        .filter(|name| is_image_name(name, media))
        .collect()
}

fn is_image_name(name: &str, media: &MediaConfig) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| media.is_image_extension(ext))
}

/// Build an item from a file name and its (possibly empty) sidecar.
pub fn build_item(
    artist_id: &str,
    file_name: &str,
    meta: RawMetadata,
    media: &MediaConfig,
) -> Item {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let meta_id = metadata::id_field(&meta);
    let post = grouping::resolve_post(stem, meta_id);

    Item {
        artist_id: artist_id.to_string(),
        file_name: file_name.to_string(),
        media_ref: media_ref(&media.prefix, artist_id, file_name),
        numeric_id: meta_id.or_else(|| grouping::first_digit_run(stem)),
        post_id: post.post_id,
        page_index: post.page_index,
        title: metadata::string_field(&meta, "title")
            .unwrap_or_default()
            .to_string(),
        caption: metadata::string_field(&meta, "caption")
            .unwrap_or_default()
            .to_string(),
        tags: metadata::tags(&meta),
        create_date: metadata::create_date(&meta),
        likes: metadata::count_field(&meta, "total_bookmarks"),
        views: metadata::count_field(&meta, "total_view"),
        comments: metadata::comments(&meta),
        raw_metadata: meta,
    }
}

/// `<prefix>/<artist>/<file>` with both components percent-encoded.
pub fn media_ref(prefix: &str, artist_id: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{}",
        prefix.trim_end_matches('/'),
        encode_component(artist_id),
        encode_component(file_name)
    )
}

/// Bytes escaped in a path component: everything but the URI-component
/// unreserved set (`A-Z a-z 0-9 - _ . ! ~ * ' ( )`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

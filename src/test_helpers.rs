//! Shared test utilities for the works-index test suite.
//!
//! Provides an [`Item`] builder for in-memory query tests, fixture writers
//! for filesystem scan tests, and a couple of extractors for view results.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let it = item("1001", "88100_p0.jpg")
//!     .post(88100, 0)
//!     .date("2024-01-01")
//!     .tags(&["sea"])
//!     .build();
//!
//! let tmp = TempDir::new().unwrap();
//! write_image(tmp.path(), "88100_p0.jpg");
//! write_sidecar(tmp.path(), "88100_p0.jpg", r#"{"id": 88100}"#);
//! ```

use std::path::Path;

use crate::metadata::sidecar_path;
use crate::scan::media_ref;
use crate::types::{Item, ViewResult};

// =========================================================================
// Item builder
// =========================================================================

/// Start building an item with only artist and file name set.
pub fn item(artist_id: &str, file_name: &str) -> ItemBuilder {
    ItemBuilder(Item {
        artist_id: artist_id.to_string(),
        file_name: file_name.to_string(),
        media_ref: media_ref("/media", artist_id, file_name),
        ..Default::default()
    })
}

pub struct ItemBuilder(Item);

impl ItemBuilder {
    pub fn post(mut self, post_id: u64, page_index: u64) -> Self {
        self.0.post_id = Some(post_id);
        self.0.page_index = page_index;
        self
    }

    pub fn numeric_id(mut self, id: u64) -> Self {
        self.0.numeric_id = Some(id);
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.0.create_date = Some(date.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.0.title = title.to_string();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.0.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Attach raw sidecar metadata. Panics unless `value` is an object.
    pub fn meta(mut self, value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => self.0.raw_metadata = map,
            other => panic!("metadata must be a JSON object, got {other}"),
        }
        self
    }

    pub fn build(self) -> Item {
        self.0
    }
}

// =========================================================================
// Fixture writers
// =========================================================================

/// Write a placeholder image file. Scanning only looks at the extension.
pub fn write_image(dir: &Path, file_name: &str) {
    std::fs::write(dir.join(file_name), b"fake image").unwrap();
}

/// Write the sidecar for `file_name` with the given raw contents.
pub fn write_sidecar(dir: &Path, file_name: &str, json: &str) {
    std::fs::write(sidecar_path(&dir.join(file_name)), json).unwrap();
}

// =========================================================================
// View extractors
// =========================================================================

/// File names of the entries in a view (first page for groups), in order.
pub fn entry_files(view: &ViewResult) -> Vec<&str> {
    view.items
        .iter()
        .map(|e| e.item().file_name.as_str())
        .collect()
}

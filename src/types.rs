//! Shared types produced by the scanner and consumed by the query engine.
//!
//! Everything here serializes to the camelCase JSON contract a transport
//! layer hands to clients. Field names on the wire are fixed; Rust names
//! follow Rust conventions and are renamed by serde.

use crate::metadata::{self, RawMetadata};
use chrono::SecondsFormat;
use serde::{Serialize, Serializer};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Total ordering key for items: newest first, then higher post id, then
/// lower page index. Artist id and file name make the order total.
pub type SortKey = (Reverse<i64>, Reverse<u64>, u64, String, String);

/// One physical image file with its normalized sidecar metadata.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub artist_id: String,
    pub file_name: String,
    /// Locator the transport layer resolves to image bytes.
    pub media_ref: String,
    /// Metadata `id`, or the first digit run of the file name.
    pub numeric_id: Option<u64>,
    /// Multi-page submission this file belongs to, if any.
    pub post_id: Option<u64>,
    pub page_index: u64,
    pub title: String,
    pub caption: String,
    pub tags: Vec<String>,
    pub create_date: Option<String>,
    pub likes: Option<u64>,
    pub views: Option<u64>,
    pub comments: Vec<Comment>,
    /// The parsed sidecar object, empty when there was no usable sidecar.
    pub raw_metadata: RawMetadata,
}

impl Item {
    /// Milliseconds since the epoch for ordering. Missing or unparsable
    /// dates count as the epoch itself.
    pub fn timestamp_millis(&self) -> i64 {
        self.create_date
            .as_deref()
            .and_then(metadata::parse_date)
            .map(|d| d.timestamp_millis())
            .unwrap_or(0)
    }

    /// Creation date as RFC 3339 in UTC, `"unknown"` when absent or unparsable.
    pub fn display_date(&self) -> String {
        self.create_date
            .as_deref()
            .and_then(metadata::parse_date)
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn sort_key(&self) -> SortKey {
        (
            Reverse(self.timestamp_millis()),
            Reverse(self.post_id.unwrap_or(0)),
            self.page_index,
            self.artist_id.clone(),
            self.file_name.clone(),
        )
    }
}

/// Sort items into canonical order. Dates are parsed once per item.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by_cached_key(Item::sort_key);
}

/// A comment attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Lightweight summary of one page inside a grouped post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub media_ref: String,
    pub file_name: String,
    pub page_index: u64,
    pub numeric_id: Option<u64>,
    pub title: String,
}

impl From<&Item> for PageSummary {
    fn from(item: &Item) -> Self {
        Self {
            media_ref: item.media_ref.clone(),
            file_name: item.file_name.clone(),
            page_index: item.page_index,
            numeric_id: item.numeric_id,
            title: item.title.clone(),
        }
    }
}

/// One post collapsed to its first page, carrying every page in order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedItem {
    #[serde(flatten)]
    pub representative: Item,
    pub group_count: usize,
    pub pages: Vec<PageSummary>,
}

/// Entry in a view: a single item, or a grouped post when grouping is on.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ViewEntry {
    Item(Item),
    Group(GroupedItem),
}

impl ViewEntry {
    /// The item shown for this entry (the first page for groups).
    pub fn item(&self) -> &Item {
        match self {
            ViewEntry::Item(item) => item,
            ViewEntry::Group(group) => &group.representative,
        }
    }
}

/// Display identity of an artist, derived from item metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfile {
    pub name: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// The most recent item of an artist, used as a thumbnail in artist lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPreview {
    pub media_ref: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub artists: usize,
    pub pictures: usize,
}

/// Resolved page size: a number, or every matching entry on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerPage {
    All,
    Count(u32),
}

impl Serialize for PerPage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PerPage::All => serializer.serialize_str("all"),
            PerPage::Count(n) => serializer.serialize_u32(*n),
        }
    }
}

/// Everything a client needs to render one view of the library.
///
/// Request values echoed here are the resolved ones: out-of-range or
/// malformed inputs have already been corrected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResult {
    pub artist_list: Vec<String>,
    pub totals: Totals,
    pub artist_counts: BTreeMap<String, usize>,
    pub artist_profiles: BTreeMap<String, ArtistProfile>,
    pub artist_previews: BTreeMap<String, Option<ArtistPreview>>,
    pub selected_artist: String,
    pub tags: Vec<String>,
    pub title: String,
    pub group_by_post: bool,
    pub page: usize,
    pub per_page: PerPage,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<ViewEntry>,
}

//! Query engine: turns request parameters into one fully materialized view.
//!
//! ## Pipeline
//!
//! ```text
//! raw params ──normalize──▶ ViewQuery
//!                              │
//! LibraryIndex ──select artist─┴─▶ filter tags ─▶ filter title
//!                                        │
//!                          group by post (optional)
//!                                        │
//!                          count ─▶ page size ─▶ clamp page ─▶ slice
//! ```
//!
//! The order is fixed. Filtering happens before grouping, so a post whose
//! pages only partly match shows up with just the matching pages.
//!
//! ## Normalization
//!
//! Nothing here rejects input. Every parameter is corrected to the nearest
//! valid value and the corrected values are echoed in the [`ViewResult`]:
//!
//! | Parameter | Rule |
//! |-----------|------|
//! | `artist` | unknown ids become `"all"` |
//! | `tag` | repeatable, comma-split, trimmed, lowercased, de-duplicated |
//! | `title` | trimmed, lowercased substring |
//! | `groupByPost` | `1` / `true` / `yes` (any case) enable grouping |
//! | `page` | leading integer, anything below 1 becomes 1, clamped to the last page |
//! | `perPage` | one of the configured sizes or `all`, else the default |

use crate::config::{LibraryConfig, PaginationConfig};
use crate::grouping;
use crate::library::LibraryIndex;
use crate::types::{GroupedItem, Item, PageSummary, PerPage, ViewEntry, ViewResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Artist selector meaning "every artist".
pub const ALL_ARTISTS: &str = "all";

/// Request parameters exactly as received, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewParams {
    pub artist: Option<String>,
    /// Every `tag` value received; each may hold several comma-separated tags.
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub group_by_post: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ViewParams {
    /// Collect params from decoded query-string pairs.
    ///
    /// `tag` accumulates; for every other key the first occurrence wins.
    /// Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "tag" => {
                    params.tags.push(value.into());
                    continue;
                }
                "artist" => &mut params.artist,
                "title" => &mut params.title,
                "groupByPost" => &mut params.group_by_post,
                "page" => &mut params.page,
                "perPage" => &mut params.per_page,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}

/// Normalized request. Artist validity is checked against the index later.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub artist: String,
    pub tags: Vec<String>,
    pub title: String,
    pub group_by_post: bool,
    pub page: usize,
    pub per_page: PerPage,
}

impl ViewQuery {
    pub fn from_params(params: &ViewParams, pagination: &PaginationConfig) -> Self {
        Self {
            artist: params
                .artist
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| ALL_ARTISTS.to_string()),
            tags: parse_tags(&params.tags),
            title: parse_title(params.title.as_deref()),
            group_by_post: parse_group_by_post(params.group_by_post.as_deref()),
            page: parse_page(params.page.as_deref()),
            per_page: parse_per_page(params.per_page.as_deref(), pagination),
        }
    }
}

// =============================================================================
// Parameter normalization
// =============================================================================

/// Leading integer of a string, the way lenient number inputs read it:
/// `" 12abc"` → 12, `"-3"` → -3, `"abc"` → none. Saturates on overflow.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Requested page, at least 1.
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(parse_int_prefix)
        .filter(|&n| n >= 1)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(1)
}

/// Requested page size: `all`, one of the configured options, or the default.
pub fn parse_per_page(raw: Option<&str>, pagination: &PaginationConfig) -> PerPage {
    if raw == Some("all") {
        return PerPage::All;
    }
    raw.and_then(parse_int_prefix)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| pagination.options.contains(n))
        .map(PerPage::Count)
        .unwrap_or(PerPage::Count(pagination.default))
}

/// Split, trim, lowercase and de-duplicate tag filters, keeping first-seen order.
pub fn parse_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for part in raw.iter().flat_map(|entry| entry.split(',')) {
        let tag = part.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub fn parse_title(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_lowercase()
}

pub fn parse_group_by_post(raw: Option<&str>) -> bool {
    matches!(
        raw.unwrap_or_default().trim().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

// =============================================================================
// Filtering
// =============================================================================

/// Every needle must be a substring of at least one of the item's tags,
/// compared case-insensitively. No needles matches everything.
pub fn matches_tags(item: &Item, needles: &[String]) -> bool {
    if needles.is_empty() {
        return true;
    }
    let lowered: Vec<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();
    needles
        .iter()
        .all(|needle| lowered.iter().any(|tag| tag.contains(needle.as_str())))
}

/// Case-insensitive substring match on the title. Empty query matches all.
pub fn matches_title(item: &Item, needle: &str) -> bool {
    needle.is_empty() || item.title.to_lowercase().contains(needle)
}

// =============================================================================
// Grouping
// =============================================================================

/// Key a file is grouped under within its artist: the post id, else the
/// numeric id, else the first digit run of the file name, else 0.
pub fn group_key(item: &Item) -> u64 {
    item.post_id
        .filter(|&n| n > 0)
        .or(item.numeric_id.filter(|&n| n > 0))
        .or_else(|| grouping::first_digit_run(&item.file_name).filter(|&n| n > 0))
        .unwrap_or(0)
}

/// Collapse items into posts. Pages are ordered by page index; posts are
/// ordered by their first page in canonical item order.
pub fn group_posts<'a>(items: &[&'a Item]) -> Vec<Vec<&'a Item>> {
    let mut slots: HashMap<(&str, u64), usize> = HashMap::new();
    let mut groups: Vec<Vec<&Item>> = Vec::new();

    for &item in items {
        let key = (item.artist_id.as_str(), group_key(item));
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    for pages in &mut groups {
        pages.sort_by(|a, b| {
            a.page_index
                .cmp(&b.page_index)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
    }
    groups.sort_by_cached_key(|pages| pages[0].sort_key());
    groups
}

fn to_grouped_item(pages: &[&Item]) -> GroupedItem {
    GroupedItem {
        representative: pages[0].clone(),
        group_count: pages.len(),
        pages: pages.iter().map(|&item| PageSummary::from(item)).collect(),
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// The slice of a result set shown on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Requested page clamped to `1..=total_pages`.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

/// Clamp the requested page and compute the slice bounds.
///
/// `all` shows every entry on one page; an empty set still has one page.
pub fn paginate(total: usize, requested_page: usize, per_page: PerPage) -> PageWindow {
    let page_size = match per_page {
        PerPage::All => total.max(1),
        PerPage::Count(n) => usize::try_from(n).unwrap_or(usize::MAX).max(1),
    };
    let total_pages = total.div_ceil(page_size).max(1);
    let page = requested_page.clamp(1, total_pages);
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    PageWindow {
        page,
        page_size,
        total_pages,
        start,
        end,
    }
}

// =============================================================================
// View resolution
// =============================================================================

/// Resolve a normalized query against an index.
pub fn select_view(index: &LibraryIndex, query: &ViewQuery) -> ViewResult {
    let artist = if query.artist == ALL_ARTISTS || index.contains_artist(&query.artist) {
        query.artist.clone()
    } else {
        tracing::debug!(artist = %query.artist, "unknown artist, showing all");
        ALL_ARTISTS.to_string()
    };

    let base: &[Item] = if artist == ALL_ARTISTS {
        &index.items
    } else {
        index.artist_items(&artist)
    };

    let filtered: Vec<&Item> = base
        .iter()
        .filter(|item| matches_tags(item, &query.tags))
        .filter(|item| matches_title(item, &query.title))
        .collect();

    let (window, total_items, items) = if query.group_by_post {
        let groups = group_posts(&filtered);
        let window = paginate(groups.len(), query.page, query.per_page);
        let entries = groups[window.start..window.end]
            .iter()
            .map(|pages| ViewEntry::Group(to_grouped_item(pages)))
            .collect();
        (window, groups.len(), entries)
    } else {
        let window = paginate(filtered.len(), query.page, query.per_page);
        let entries = filtered[window.start..window.end]
            .iter()
            .map(|&item| ViewEntry::Item(item.clone()))
            .collect();
        (window, filtered.len(), entries)
    };

    ViewResult {
        artist_list: index.artist_list.clone(),
        totals: index.totals(),
        artist_counts: index.artist_counts.clone(),
        artist_profiles: index.artist_profiles.clone(),
        artist_previews: index.artist_previews.clone(),
        selected_artist: artist,
        tags: query.tags.clone(),
        title: query.title.clone(),
        group_by_post: query.group_by_post,
        page: window.page,
        per_page: query.per_page,
        total_items,
        total_pages: window.total_pages,
        items,
    }
}

/// Entry point for serving views: owns the works root and configuration,
/// and rebuilds the library index from disk on every call.
///
/// Holds no mutable state, so one engine can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    root: PathBuf,
    config: LibraryConfig,
}

impl QueryEngine {
    pub fn new(root: impl Into<PathBuf>, config: LibraryConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the works root as it is right now.
    pub fn build_index(&self) -> LibraryIndex {
        LibraryIndex::build(&self.root, &self.config)
    }

    /// Normalize `params`, take a fresh snapshot of the library, and
    /// produce the requested view.
    pub fn resolve_view(&self, params: &ViewParams) -> ViewResult {
        let query = ViewQuery::from_params(params, &self.config.pagination);
        let index = self.build_index();
        select_view(&index, &query)
    }
}

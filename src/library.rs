//! Library index: every artist under the works root, scanned and aggregated.
//!
//! ## Layout detection
//!
//! ```text
//! works/                 works/12345/
//! ├── 1001/              ├── 88100_p0.jpg
//! ├── 1002/              └── 88100_p0.jpg.json
//! └── downloads/
//! ```
//!
//! On the left, each purely numeric subdirectory of the root is one artist
//! (`downloads/` is ignored). On the right, there are no numeric
//! subdirectories, so the root itself is scanned as a single artist. Its id
//! is the root's own name when numeric, else the configured fallback id.
//!
//! The index is rebuilt from the filesystem for every query and discarded
//! afterwards. Nothing is cached between builds.

use crate::config::LibraryConfig;
use crate::metadata::{self, Extractor};
use crate::scan;
use crate::types::{ArtistPreview, ArtistProfile, Item, Totals, sort_items};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Aggregate view of the whole library at one point in time.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    /// Artist ids, sorted lexicographically.
    pub artist_list: Vec<String>,
    /// Every item across artists, in canonical order.
    pub items: Vec<Item>,
    /// Each artist's items, in canonical order.
    pub items_by_artist: BTreeMap<String, Vec<Item>>,
    pub artist_counts: BTreeMap<String, usize>,
    pub artist_profiles: BTreeMap<String, ArtistProfile>,
    /// Most recent item per artist; `None` for artists without items.
    pub artist_previews: BTreeMap<String, Option<ArtistPreview>>,
}

impl LibraryIndex {
    /// Scan `root` and build the index.
    pub fn build(root: &Path, config: &LibraryConfig) -> Self {
        let artists = discover_artists(root, &config.artists.fallback_id)
            .into_iter()
            .map(|(id, dir)| {
                let items = scan::scan_artist(&id, &dir, &config.media);
                (id, items)
            })
            .collect();
        let index = Self::from_artists(artists);
        tracing::debug!(
            root = %root.display(),
            artists = index.artist_list.len(),
            items = index.items.len(),
            "built library index"
        );
        index
    }

    /// Aggregate already-scanned artists. Item lists are re-sorted.
    pub fn from_artists(artists: BTreeMap<String, Vec<Item>>) -> Self {
        let mut index = Self::default();

        for (artist_id, mut items) in artists {
            sort_items(&mut items);
            index.artist_counts.insert(artist_id.clone(), items.len());
            index
                .artist_profiles
                .insert(artist_id.clone(), derive_profile(&artist_id, &items));
            index.artist_previews.insert(
                artist_id.clone(),
                items.first().map(|latest| ArtistPreview {
                    media_ref: latest.media_ref.clone(),
                    title: latest.title.clone(),
                }),
            );
            index.items.extend(items.iter().cloned());
            index.artist_list.push(artist_id.clone());
            index.items_by_artist.insert(artist_id, items);
        }

        sort_items(&mut index.items);
        index
    }

    pub fn contains_artist(&self, artist_id: &str) -> bool {
        self.items_by_artist.contains_key(artist_id)
    }

    /// Items of one artist; empty for unknown ids.
    pub fn artist_items(&self, artist_id: &str) -> &[Item] {
        self.items_by_artist
            .get(artist_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn totals(&self) -> Totals {
        Totals {
            artists: self.artist_list.len(),
            pictures: self.items.len(),
        }
    }
}

/// Whether a directory name identifies an artist.
pub fn is_artist_dir_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Find artist directories under `root`, or treat `root` as one artist.
pub fn discover_artists(root: &Path, fallback_id: &str) -> BTreeMap<String, PathBuf> {
    let artists: BTreeMap<String, PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "cannot read works root entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            is_artist_dir_name(&name).then(|| (name, entry.into_path()))
        })
        .collect();

    if !artists.is_empty() {
        return artists;
    }

    let resolved = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let id = resolved
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| is_artist_dir_name(n))
        .unwrap_or(fallback_id)
        .to_string();
    BTreeMap::from([(id, root.to_path_buf())])
}

/// Derive an artist's profile from the raw metadata of its items.
///
/// Each field takes the first non-empty value found, walking items in
/// canonical order. The name falls back to the artist id.
pub fn derive_profile(artist_id: &str, items: &[Item]) -> ArtistProfile {
    let first = |extractors: &[Extractor]| {
        items
            .iter()
            .find_map(|item| metadata::extract(&item.raw_metadata, extractors))
    };

    ArtistProfile {
        name: first(metadata::ARTIST_NAME).unwrap_or_else(|| artist_id.to_string()),
        username: first(metadata::ARTIST_USERNAME).unwrap_or_default(),
        bio: first(metadata::ARTIST_BIO),
        avatar_url: first(metadata::ARTIST_AVATAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{item, write_image, write_sidecar};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn numeric_subdirectories_are_artists() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("200")).unwrap();
        fs::create_dir(tmp.path().join("1001")).unwrap();
        fs::create_dir(tmp.path().join("downloads")).unwrap();
        fs::create_dir(tmp.path().join("12a")).unwrap();
        write_image(tmp.path(), "999.jpg");

        let artists = discover_artists(tmp.path(), "single");
        let ids: Vec<&str> = artists.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["1001", "200"]);
    }

    #[test]
    fn root_without_artist_dirs_is_single_artist() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("my-folder");
        fs::create_dir(&root).unwrap();
        write_image(&root, "1_p0.jpg");

        let artists = discover_artists(&root, "single");
        assert_eq!(artists.len(), 1);
        assert_eq!(artists.get("single"), Some(&root));
    }

    #[test]
    fn numeric_root_uses_its_own_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("12345");
        fs::create_dir(&root).unwrap();
        write_image(&root, "1_p0.jpg");

        let index = LibraryIndex::build(&root, &LibraryConfig::default());
        assert_eq!(index.artist_list, vec!["12345"]);
        assert_eq!(index.items[0].media_ref, "/media/12345/1_p0.jpg");
    }

    #[test]
    fn missing_root_yields_empty_fallback_artist() {
        let tmp = TempDir::new().unwrap();
        let index = LibraryIndex::build(&tmp.path().join("absent"), &LibraryConfig::default());
        assert_eq!(index.artist_list, vec!["single"]);
        assert!(index.items.is_empty());
        assert_eq!(index.artist_previews.get("single"), Some(&None));
    }

    #[test]
    fn build_aggregates_counts_previews_and_global_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("1");
        let b = tmp.path().join("2");
        let empty = tmp.path().join("3");
        for dir in [&a, &b, &empty] {
            fs::create_dir(dir).unwrap();
        }
        write_image(&a, "10_p0.jpg");
        write_sidecar(&a, "10_p0.jpg", r#"{"title": "Old", "date": "2020-01-01"}"#);
        write_image(&a, "11_p0.jpg");
        write_sidecar(&a, "11_p0.jpg", r#"{"title": "Mid", "date": "2022-01-01"}"#);
        write_image(&b, "20_p0.jpg");
        write_sidecar(&b, "20_p0.jpg", r#"{"title": "New", "date": "2024-01-01"}"#);

        let index = LibraryIndex::build(tmp.path(), &LibraryConfig::default());

        assert_eq!(index.artist_list, vec!["1", "2", "3"]);
        assert_eq!(index.totals(), Totals { artists: 3, pictures: 3 });
        assert_eq!(index.artist_counts["1"], 2);
        assert_eq!(index.artist_counts["3"], 0);

        let titles: Vec<&str> = index.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);

        let preview = index.artist_previews["1"].as_ref().unwrap();
        assert_eq!(preview.title, "Mid");
        assert_eq!(preview.media_ref, "/media/1/11_p0.jpg");
        assert_eq!(index.artist_previews["3"], None);
    }

    #[test]
    fn artist_items_for_unknown_id_is_empty() {
        let index = LibraryIndex::from_artists(BTreeMap::from([(
            "1".to_string(),
            vec![item("1", "a.jpg").build()],
        )]));
        assert!(index.contains_artist("1"));
        assert!(!index.contains_artist("9"));
        assert!(index.artist_items("9").is_empty());
        assert_eq!(index.artist_items("1").len(), 1);
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    #[test]
    fn profile_defaults_to_artist_id() {
        let items = vec![item("77", "a.jpg").build()];
        let profile = derive_profile("77", &items);
        assert_eq!(profile.name, "77");
        assert_eq!(profile.username, "");
        assert_eq!(profile.bio, None);
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn profile_taken_from_first_item_with_user_info() {
        let items = vec![
            item("77", "a.jpg").meta(json!({"user": {"name": "  "}})).build(),
            item("77", "b.jpg")
                .meta(json!({"user": {"name": "Mika", "account": "mika_draws", "comment": "hi"}}))
                .build(),
            item("77", "c.jpg")
                .meta(json!({"user": {"name": "Other", "account": "other"}}))
                .build(),
        ];
        let profile = derive_profile("77", &items);
        assert_eq!(profile.name, "Mika");
        assert_eq!(profile.username, "mika_draws");
        assert_eq!(profile.bio.as_deref(), Some("hi"));
    }

    #[test]
    fn profile_fields_resolve_independently() {
        let items = vec![
            item("5", "a.jpg").meta(json!({"user_account": "first_acct"})).build(),
            item("5", "b.jpg")
                .meta(json!({"artist_name": "Named Later",
                    "profile_image_urls": {"medium": "https://x/a.png"}}))
                .build(),
        ];
        let profile = derive_profile("5", &items);
        assert_eq!(profile.name, "Named Later");
        assert_eq!(profile.username, "first_acct");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://x/a.png"));
    }
}

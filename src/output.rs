//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The primary display for every artist and item is its semantic identity
//! (profile name, title) with identifiers and file names as secondary,
//! indented context. This keeps the inventory readable while still letting
//! users trace every line back to a file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Artists
//! 001 Mika @mika_draws (3 pictures)
//!     Id: 1001
//!     Latest: Harbor (2024-02-03T04:05:00Z)
//!     001 Harbor
//!         File: 88100_p0.jpg
//!         Post: 88100, page 0
//!     002 (sketch.png)
//!         File: sketch.png
//! 002 1002 (0 pictures)
//!     Id: 1002
//!
//! 2 artists, 3 pictures
//! ```
//!
//! ## View summary
//!
//! ```text
//! Artist: all | Tags: red, blue | Title: - | Grouped: yes
//! Page 1 of 3 (100 per page), 245 entries
//! ```
//!
//! Format functions return `Vec<String>` and do no I/O; `print_*` wrappers
//! write to stdout.

use crate::library::LibraryIndex;
use crate::types::{Item, PerPage, ViewResult};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Titled items show the title, untitled ones the file name in parens.
///
/// ```text
/// 001 Harbor
/// 002 (sketch.png)
/// ```
fn item_line(index: usize, item: &Item) -> String {
    if item.title.is_empty() {
        format!("{} ({})", format_index(index), item.file_name)
    } else {
        format!("{} {}", format_index(index), item.title)
    }
}

fn item_context(item: &Item, depth: usize) -> Vec<String> {
    let mut lines = vec![format!("{}File: {}", indent(depth), item.file_name)];
    if let Some(post_id) = item.post_id {
        lines.push(format!(
            "{}Post: {}, page {}",
            indent(depth),
            post_id,
            item.page_index
        ));
    }
    if !item.tags.is_empty() {
        lines.push(format!("{}Tags: {}", indent(depth), item.tags.join(", ")));
    }
    lines
}

/// Inventory of the library. `with_items` lists every item under its artist.
pub fn format_library(index: &LibraryIndex, with_items: bool) -> Vec<String> {
    let mut lines = vec!["Artists".to_string()];

    for (pos, artist_id) in index.artist_list.iter().enumerate() {
        let items = index.artist_items(artist_id);
        let profile = index.artist_profiles.get(artist_id);
        let name = profile.map(|p| p.name.as_str()).unwrap_or(artist_id);
        let mut header = format!("{} {}", format_index(pos + 1), name);
        if let Some(p) = profile.filter(|p| !p.username.is_empty()) {
            header.push_str(&format!(" @{}", p.username));
        }
        header.push_str(&format!(" ({} pictures)", items.len()));
        lines.push(header);
        lines.push(format!("{}Id: {}", indent(1), artist_id));

        if let Some(latest) = items.first() {
            let title = if latest.title.is_empty() {
                latest.file_name.as_str()
            } else {
                latest.title.as_str()
            };
            lines.push(format!(
                "{}Latest: {} ({})",
                indent(1),
                title,
                latest.display_date()
            ));
        }

        if with_items {
            for (i, item) in items.iter().enumerate() {
                lines.push(format!("{}{}", indent(1), item_line(i + 1, item)));
                lines.extend(item_context(item, 2));
            }
        }
    }

    let totals = index.totals();
    lines.push(String::new());
    lines.push(format!(
        "{} artists, {} pictures",
        totals.artists, totals.pictures
    ));
    lines
}

pub fn print_library(index: &LibraryIndex, with_items: bool) {
    for line in format_library(index, with_items) {
        println!("{}", line);
    }
}

/// Two-line summary of a resolved view.
pub fn format_view_summary(view: &ViewResult) -> Vec<String> {
    let tags = if view.tags.is_empty() {
        "-".to_string()
    } else {
        view.tags.join(", ")
    };
    let title = if view.title.is_empty() {
        "-"
    } else {
        view.title.as_str()
    };
    let per_page = match view.per_page {
        PerPage::All => "all".to_string(),
        PerPage::Count(n) => n.to_string(),
    };
    vec![
        format!(
            "Artist: {} | Tags: {} | Title: {} | Grouped: {}",
            view.selected_artist,
            tags,
            title,
            if view.group_by_post { "yes" } else { "no" }
        ),
        format!(
            "Page {} of {} ({} per page), {} entries",
            view.page, view.total_pages, per_page, view.total_items
        ),
    ]
}

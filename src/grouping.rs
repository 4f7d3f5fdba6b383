//! Post grouping: which multi-page post a file belongs to, and at which page.
//!
//! Files arrive from several download tools, each with its own naming
//! convention. Resolution tries them in order and the first match wins:
//!
//! 1. **Id prefix**: the stem is all digits and starts with the metadata id.
//!    `9001` + id `900` → post 900, page 1. `900` + id `900` → page 0.
//! 2. **Paged name**: `<post>_p<page>`, `<post>-p<page>` (the `p` in either
//!    case) or `<post>_<page>` / `<post>-<page>`.
//!    `88100_p3` → post 88100, page 3.
//! 3. **Fallback**: post is the metadata id, else the first digit run in the
//!    stem, else absent; page is 0.
//!
//! Anything unrecognized degrades to an ungrouped single page rather than
//! an error. Resolution is a pure function of stem and metadata id, so the
//! same file always lands in the same post.

/// Where a file sits within a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostKey {
    pub post_id: Option<u64>,
    pub page_index: u64,
}

/// Resolve the post and page for a file stem (name without extension).
pub fn resolve_post(stem: &str, meta_id: Option<u64>) -> PostKey {
    let meta_id = meta_id.filter(|&id| id > 0);

    if let Some(id) = meta_id
        && let Some(page_index) = page_after_id_prefix(stem, id)
    {
        return PostKey {
            post_id: Some(id),
            page_index,
        };
    }

    if let Some((post_id, page_index)) = parse_paged_name(stem) {
        return PostKey {
            post_id: Some(post_id),
            page_index,
        };
    }

    PostKey {
        post_id: meta_id.or_else(|| first_digit_run(stem).filter(|&n| n > 0)),
        page_index: 0,
    }
}

/// First run of ASCII digits in `name`, if any and if it fits in a `u64`.
pub fn first_digit_run(name: &str) -> Option<u64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let rest = &name[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Page index when `stem` is all digits and begins with `id`'s decimal form.
fn page_after_id_prefix(stem: &str, id: u64) -> Option<u64> {
    if !is_all_digits(stem) {
        return None;
    }
    let suffix = stem.strip_prefix(id.to_string().as_str())?;
    Some(if suffix.is_empty() {
        0
    } else {
        suffix.parse().unwrap_or(0)
    })
}

/// Split `<digits>[_-][pP]?<digits>` into (post, page).
fn parse_paged_name(stem: &str) -> Option<(u64, u64)> {
    let split = stem.find(|c: char| !c.is_ascii_digit())?;
    let (post, rest) = stem.split_at(split);
    if post.is_empty() {
        return None;
    }
    let rest = rest.strip_prefix(&['_', '-'][..])?;
    let page = rest.strip_prefix(&['p', 'P'][..]).unwrap_or(rest);
    if !is_all_digits(page) {
        return None;
    }
    Some((post.parse().ok()?, page.parse().ok()?))
}

//! # Works Index
//!
//! Indexes a directory tree of artist folders (images plus per-file JSON
//! sidecars) and answers parameterized views over it: artist filter, tag
//! filter, title search, multi-page post grouping, and pagination. The
//! filesystem is the only data source; nothing is persisted.
//!
//! # Architecture: Scan, Aggregate, Query
//!
//! ```text
//! 1. Scan       1001/*.jpg + *.json  →  Vec<Item>       (per artist)
//! 2. Aggregate  all artists          →  LibraryIndex    (sorted, profiles, previews)
//! 3. Query      LibraryIndex + params →  ViewResult      (filter, group, paginate)
//! ```
//!
//! Every query runs all three stages against the current state of the disk
//! and throws the index away afterwards. Results are a pure function of the
//! directory snapshot and the request.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | Sidecar loading, defensive field access, profile extractors |
//! | [`grouping`] | Post/page resolution from file name conventions |
//! | [`scan`] | Lists one artist directory and builds normalized items |
//! | [`library`] | Discovers artists and aggregates the library index |
//! | [`query`] | Parameter normalization, filtering, grouping, pagination |
//! | [`types`] | Items, grouped items, and the serialized view contract |
//! | [`config`] | Optional `config.toml` in the works root |
//! | [`output`] | CLI text formatting |
//!
//! # Design Decisions
//!
//! ## Forgiving Inputs
//!
//! Nothing in the scan or query path returns an error. Unreadable
//! directories contribute no items, broken sidecars count as missing, and
//! malformed request parameters are corrected to the nearest valid value.
//! The corrected values are echoed back so callers can trust the response
//! over what they asked for. Only configuration loading can fail.
//!
//! ## Deterministic Order
//!
//! Items sort by creation date (newest first), then post id (highest
//! first), then page index. Artist id and file name break any remaining
//! ties, so two runs over the same files always produce the same pages.
//!
//! ## Explicit Root
//!
//! The works root is passed in by the caller. There is no search for a
//! "likely" directory, so the engine holds no global state and a single
//! [`query::QueryEngine`] can be shared between concurrent callers.

pub mod config;
pub mod grouping;
pub mod library;
pub mod metadata;
pub mod output;
pub mod query;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

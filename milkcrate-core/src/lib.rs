//! milkcrate-core: the catalog side of milkcrate.
//!
//! An S3-compatible bucket is the sole source of truth. Object keys follow
//! the `{artist}/{album}/{trackNumber}__{title}.{ext}` schema; this crate
//! lists them, parses them, folds them into an in-memory catalog, and
//! produces versioned JSON exports of that catalog at root/artist/album
//! scope. There is no database and no incremental update path: the catalog
//! is derived fresh from a full listing whenever it is needed.

pub mod catalog;
pub mod export;
pub mod keys;
pub mod store;

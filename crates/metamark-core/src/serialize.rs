//! JSON encoding of per-file metadata documents
//!
//! Key order is fixed by the entity layout: base fields first
//! (`name, full_name, attrs, comment, access`), then value fields, then
//! kind-specific fields. A file document lists `records, variables,
//! functions, enums` in that order.

use crate::meta::FileMetaInfo;
use eyre::{Result, WrapErr};

/// Compact single-line document
pub fn to_json(file: &FileMetaInfo) -> Result<String> {
    serde_json::to_string(file).wrap_err("Failed to serialize file metadata")
}

/// Indented document, for humans
pub fn to_json_pretty(file: &FileMetaInfo) -> Result<String> {
    serde_json::to_string_pretty(file).wrap_err("Failed to serialize file metadata")
}

/// Parse a document produced by [`to_json`] or [`to_json_pretty`]
pub fn from_json(json: &str) -> Result<FileMetaInfo> {
    serde_json::from_str(json).wrap_err("Failed to parse file metadata JSON")
}

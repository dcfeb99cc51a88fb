//! Per-project accumulator of extracted metadata

use crate::meta::{FileMetaInfo, HasMeta};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

/// How entities from different traversal passes are combined when they land
/// in the same file bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Append every entity again, even if an earlier pass produced it
    #[default]
    Append,
    /// Drop an incoming entity already present in the same list of the same
    /// bucket from an earlier pass (first one wins). Functions and methods
    /// are compared by `full_name` plus parameter types, so overloads survive.
    Dedup,
}

impl FromStr for DuplicatePolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "append" => Ok(DuplicatePolicy::Append),
            "dedup" => Ok(DuplicatePolicy::Dedup),
            other => eyre::bail!(
                "Unknown duplicate policy '{}' (expected 'append' or 'dedup')",
                other
            ),
        }
    }
}

/// Map from project-relative path to that file's metadata.
///
/// Owned by the caller and passed by reference into each traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectMetaInfo {
    files: BTreeMap<String, FileMetaInfo>,
}

impl ProjectMetaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bucket for `path`, created empty if it does not exist yet
    pub fn file_mut(&mut self, path: &str) -> &mut FileMetaInfo {
        self.files.entry(path.to_string()).or_default()
    }

    pub fn get(&self, path: &str) -> Option<&FileMetaInfo> {
        self.files.get(path)
    }

    /// Number of buckets, including empty ones
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Buckets in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileMetaInfo)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    /// Drop every bucket whose four lists are all empty
    pub fn prune_empty(&mut self) {
        self.files.retain(|_, file| !file.is_empty());
    }

    /// Consume the project, yielding non-empty buckets in path order
    pub fn into_non_empty(self) -> impl Iterator<Item = (String, FileMetaInfo)> {
        self.files.into_iter().filter(|(_, file)| !file.is_empty())
    }

    /// Merge another accumulator into this one, bucket by bucket.
    ///
    /// Entities keep their order: everything already here comes first, then
    /// the incoming entities in their original order.
    pub fn merge(&mut self, other: ProjectMetaInfo, policy: DuplicatePolicy) {
        for (path, incoming) in other.files {
            let file = self.file_mut(&path);
            match policy {
                DuplicatePolicy::Append => {
                    file.records.extend(incoming.records);
                    file.variables.extend(incoming.variables);
                    file.functions.extend(incoming.functions);
                    file.enums.extend(incoming.enums);
                }
                DuplicatePolicy::Dedup => {
                    extend_unique(&mut file.records, incoming.records);
                    extend_unique(&mut file.variables, incoming.variables);
                    extend_unique(&mut file.functions, incoming.functions);
                    extend_unique(&mut file.enums, incoming.enums);
                }
            }
        }
    }
}

/// Append the incoming entities that no earlier pass already produced.
///
/// Only entities present before this merge count as duplicates, so a single
/// pass never loses any of its own entities.
fn extend_unique<T: HasMeta>(existing: &mut Vec<T>, incoming: Vec<T>) {
    let seen: HashSet<String> = existing.iter().map(HasMeta::identity).collect();
    existing.extend(
        incoming
            .into_iter()
            .filter(|item| !seen.contains(&item.identity())),
    );
}

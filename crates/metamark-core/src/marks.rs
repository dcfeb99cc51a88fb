//! Mark database: which declarations get reflected, and with which attributes
//!
//! A mark document is a flat JSON object mapping a qualified name to an array
//! of attribute strings:
//!
//! ```json
//! { "Ns::Foo": ["serializable"], "Ns::Foo::bar": ["in"], "Ns::Tmpl<int,3>": ["gen"] }
//! ```
//!
//! Documents are merged in load order. A later document replaces an earlier
//! key's attribute list wholesale.

use crate::name::normalize;
use facet::Facet;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A mark document that was skipped
#[derive(Debug, Clone, Facet)]
pub struct MarkWarning {
    /// The document that was skipped
    pub file: PathBuf,
    pub kind: MarkWarningKind,
}

/// Why a mark document was skipped
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum MarkWarningKind {
    /// The file could not be read
    Unreadable(String),
    /// The file is not valid JSON
    Malformed(String),
    /// The top-level value is not an object
    NotAnObject,
}

impl fmt::Display for MarkWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkWarningKind::Unreadable(e) => write!(f, "cannot read mark file: {e}"),
            MarkWarningKind::Malformed(e) => write!(f, "cannot parse mark file: {e}"),
            MarkWarningKind::NotAnObject => f.write_str("mark file is not a JSON object"),
        }
    }
}

impl fmt::Display for MarkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.kind)
    }
}

/// Result of loading mark files, including documents that were skipped
#[derive(Debug, Default)]
pub struct MarkLoad {
    pub marks: MarkDatabase,
    pub warnings: Vec<MarkWarning>,
}

/// Merged map from normalized name to attribute list.
///
/// Built once before traversal and read-only afterwards, so it can be shared
/// across parallel traversals by reference.
#[derive(Debug, Clone, Default)]
pub struct MarkDatabase {
    marks: HashMap<String, Vec<String>>,
}

impl MarkDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge mark files in order.
    ///
    /// Never fails as a whole: unreadable or malformed documents are reported
    /// in [`MarkLoad::warnings`] and the rest are still merged.
    pub fn load(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> MarkLoad {
        let mut load = MarkLoad::default();

        for path in paths {
            let path = path.as_ref();
            let result = std::fs::read_to_string(path)
                .map_err(|e| MarkWarningKind::Unreadable(e.to_string()))
                .and_then(|content| load.marks.merge_json(&content));

            match result {
                Ok(count) => debug!("loaded {} marks from {}", count, path.display()),
                Err(kind) => {
                    let warning = MarkWarning {
                        file: path.to_path_buf(),
                        kind,
                    };
                    warn!("{}", warning);
                    load.warnings.push(warning);
                }
            }
        }

        load
    }

    /// Merge one mark document, returning the number of keys it contained.
    ///
    /// The document is validated before anything is inserted, so a rejected
    /// document leaves the database untouched.
    pub fn merge_json(&mut self, json: &str) -> Result<usize, MarkWarningKind> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| MarkWarningKind::Malformed(e.to_string()))?;
        let serde_json::Value::Object(entries) = value else {
            return Err(MarkWarningKind::NotAnObject);
        };

        let count = entries.len();
        for (key, value) in entries {
            // A non-array value still marks the key, it just carries no attributes
            let attrs = match value {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            self.insert(&key, attrs);
        }
        Ok(count)
    }

    /// Insert a mark, replacing any previous attributes for the same normalized key
    pub fn insert(&mut self, key: &str, attrs: Vec<String>) {
        self.marks.insert(normalize(key), attrs);
    }

    /// Whether `name` (already normalized) is marked
    pub fn is_marked(&self, name: &str) -> bool {
        self.marks.contains_key(name)
    }

    /// Attributes of a marked name, or `None` if it is not marked
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.marks.get(name).map(|attrs| attrs.as_slice())
    }

    /// Attributes of `name`; empty if it is unmarked
    pub fn attributes_of(&self, name: &str) -> &[String] {
        self.get(name).unwrap_or(&[])
    }

    /// All marked keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Sorted copy of the merged map
    pub fn to_sorted(&self) -> BTreeMap<&str, &[String]> {
        self.marks
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect()
    }

    /// Render the merged map as a pretty JSON object with sorted keys
    pub fn to_json_pretty(&self) -> String {
        // Serializing a map of strings to string lists cannot fail
        serde_json::to_string_pretty(&self.to_sorted()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_wins_merge() {
        let mut marks = MarkDatabase::new();
        marks.merge_json(r#"{"X": ["a"]}"#).unwrap();
        marks.merge_json(r#"{"X": ["b"]}"#).unwrap();
        assert_eq!(marks.attributes_of("X"), ["b"]);
        assert_eq!(marks.len(), 1);
    }

    #[test]
    fn test_no_union_of_attribute_lists() {
        let mut marks = MarkDatabase::new();
        marks.merge_json(r#"{"X": ["a", "c"]}"#).unwrap();
        marks.merge_json(r#"{"X": []}"#).unwrap();
        assert!(marks.is_marked("X"));
        assert!(marks.attributes_of("X").is_empty());
    }

    #[test]
    fn test_keys_are_normalized() {
        let mut marks = MarkDatabase::new();
        marks
            .merge_json(r#"{"Ns :: Tmpl< int, 3 >": ["gen"]}"#)
            .unwrap();
        assert!(marks.is_marked("Ns::Tmpl<int,3>"));
        assert_eq!(marks.attributes_of("Ns::Tmpl<int,3>"), ["gen"]);
    }

    #[test]
    fn test_colliding_keys_in_one_document_last_wins() {
        let mut marks = MarkDatabase::new();
        marks
            .merge_json(r#"{"A::B": ["first"], "A :: B": ["second"]}"#)
            .unwrap();
        assert_eq!(marks.attributes_of("A::B"), ["second"]);
    }

    #[test]
    fn test_non_array_value_still_marks() {
        let mut marks = MarkDatabase::new();
        let count = marks
            .merge_json(r#"{"A": "oops", "B": ["x", 3, null, "y"]}"#)
            .unwrap();
        assert_eq!(count, 2);
        assert!(marks.is_marked("A"));
        assert!(marks.attributes_of("A").is_empty());
        assert_eq!(marks.attributes_of("B"), ["x", "y"]);
    }

    #[test]
    fn test_rejected_documents() {
        let mut marks = MarkDatabase::new();
        assert_eq!(
            marks.merge_json(r#"["A"]"#),
            Err(MarkWarningKind::NotAnObject)
        );
        assert!(matches!(
            marks.merge_json("{ nope"),
            Err(MarkWarningKind::Malformed(_))
        ));
        assert!(marks.is_empty());
    }

    #[test]
    fn test_unmarked_lookup() {
        let marks = MarkDatabase::new();
        assert!(!marks.is_marked("Missing"));
        assert_eq!(marks.get("Missing"), None);
        assert!(marks.attributes_of("Missing").is_empty());
    }

    #[test]
    fn test_load_skips_bad_documents() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let array = dir.path().join("array.json");
        let broken = dir.path().join("broken.json");
        let last = dir.path().join("last.json");
        std::fs::write(&first, r#"{"X": ["a"], "Y": ["keep"]}"#).unwrap();
        std::fs::write(&array, r#"[1, 2, 3]"#).unwrap();
        std::fs::write(&broken, "{").unwrap();
        std::fs::write(&last, r#"{"X": ["b"]}"#).unwrap();
        let missing = dir.path().join("missing.json");

        let load = MarkDatabase::load([&first, &array, &missing, &broken, &last]);

        assert_eq!(load.marks.attributes_of("X"), ["b"]);
        assert_eq!(load.marks.attributes_of("Y"), ["keep"]);
        assert_eq!(load.warnings.len(), 3);
        assert_eq!(load.warnings[0].file, array);
        assert_eq!(load.warnings[0].kind, MarkWarningKind::NotAnObject);
        assert!(matches!(load.warnings[1].kind, MarkWarningKind::Unreadable(_)));
        assert!(matches!(load.warnings[2].kind, MarkWarningKind::Malformed(_)));
    }

    #[test]
    fn test_to_json_pretty_is_sorted() {
        let mut marks = MarkDatabase::new();
        marks.insert("b", vec!["2".into()]);
        marks.insert("a", vec!["1".into()]);
        let json = marks.to_json_pretty();
        let a = json.find("\"a\"").unwrap();
        let b = json.find("\"b\"").unwrap();
        assert!(a < b);
    }
}

//! metamark-core - Core library for mark-driven C++ metadata extraction
//!
//! This crate provides the building blocks for:
//! - Loading and merging mark files that select declarations for reflection
//! - Walking declaration trees produced by a C++ front-end
//! - Building per-file metadata (records, variables, functions, enums)
//! - Serializing that metadata as JSON documents
//!
//! # Features
//!
//! - `walk` - Enable [`WalkTrees`] for gitignore-aware discovery of tree dumps (brings in `ignore` and `globset`)
//! - `parallel` - Enable parallel loading and traversal (brings in `rayon`)
//!
//! # Marks
//!
//! A mark file maps normalized qualified names to attribute lists. Only marked
//! declarations are extracted; the attributes travel along into the output.
//!
//! ```json
//! { "App::Widget": ["serializable"], "App::Widget::id": ["key"], "App::Box<int,3>": [] }
//! ```
//!
//! # Extracting
//!
//! ```ignore
//! use metamark_core::{
//!     ExtractOptions, FileResolver, MarkDatabase, TreeSources, WalkTrees, extract_project,
//! };
//!
//! let marks = MarkDatabase::load(["marks/app.json"]).marks;
//! let trees = WalkTrees::new("build").load()?;
//! let resolver = FileResolver::new(".")?;
//! let outcome = extract_project(&trees.trees, &marks, &resolver, ExtractOptions::default());
//!
//! for (path, file) in outcome.project.into_non_empty() {
//!     println!("{path}: {}", metamark_core::serialize::to_json(&file)?);
//! }
//! ```
//!
//! Single trees can be walked into a caller-owned accumulator:
//!
//! ```
//! use metamark_core::{DeclTree, FileResolver, MarkDatabase, ProjectMetaInfo, extract_tree};
//!
//! let mut marks = MarkDatabase::new();
//! marks.merge_json(r#"{"area": ["pure"]}"#).unwrap();
//!
//! let tree = DeclTree::from_json(r#"{
//!     "decls": [{
//!         "kind": "function", "name": "area", "qualified_name": "area",
//!         "return_type": "double",
//!         "params": [{ "name": "r", "type": "double" }]
//!     }]
//! }"#).unwrap();
//!
//! let resolver = FileResolver::new(".").unwrap();
//! let mut project = ProjectMetaInfo::new();
//! let report = extract_tree(&tree, &marks, &resolver, &mut project);
//!
//! // No location, so it lands in the sentinel bucket
//! let file = project.get(metamark_core::UNRESOLVED_BUCKET).unwrap();
//! assert_eq!(file.functions[0].params[0].value.base.full_name, "area::r");
//! assert_eq!(report.functions, 1);
//! ```

pub mod decl;
pub mod extract;
pub mod location;
pub mod marks;
pub mod meta;
pub mod name;
pub mod project;
pub mod serialize;
pub mod sources;
pub mod walker;

pub use decl::{Decl, DeclKind, DeclTree, SourceLocation, TemplateArg};
pub use extract::{ExtractOptions, ExtractOutcome, extract_project};
pub use location::{FileResolver, UNRESOLVED_BUCKET, UnresolvedPolicy};
pub use marks::{MarkDatabase, MarkLoad, MarkWarning, MarkWarningKind};
pub use meta::{
    Access, EnumConstantMetaInfo, EnumMetaInfo, FieldMetaInfo, FileMetaInfo, FunctionMetaInfo,
    HasMeta, MetaInfo, MethodMetaInfo, ParamMetaInfo, RecordMetaInfo, ValueMetaInfo,
};
pub use name::normalize;
pub use project::{DuplicatePolicy, ProjectMetaInfo};
#[cfg(feature = "walk")]
pub use sources::WalkTrees;
pub use sources::{
    DEFAULT_TREE_PATTERN, LoadedTree, MemoryTrees, PathTrees, TreeLoad, TreeSources, TreeWarning,
};
pub use walker::{DeclarationWalker, TraversalReport, extract_tree};

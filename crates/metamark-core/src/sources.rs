//! Providers of declaration-tree dumps

use crate::decl::DeclTree;
use eyre::Result;
use facet::Facet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Default include pattern for [`WalkTrees`]
pub const DEFAULT_TREE_PATTERN: &str = "**/*.ast.json";

/// A declaration-tree dump that could not be used
#[derive(Debug, Clone, Facet)]
pub struct TreeWarning {
    pub file: PathBuf,
    pub reason: String,
}

impl fmt::Display for TreeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.reason)
    }
}

/// A parsed dump and where it came from
#[derive(Debug, Clone)]
pub struct LoadedTree {
    pub path: PathBuf,
    pub tree: DeclTree,
}

impl AsRef<DeclTree> for LoadedTree {
    fn as_ref(&self) -> &DeclTree {
        &self.tree
    }
}

/// Result of loading trees, including any dumps that were skipped
#[derive(Debug, Default)]
pub struct TreeLoad {
    /// Parsed trees, in input order
    pub trees: Vec<LoadedTree>,
    pub warnings: Vec<TreeWarning>,
}

/// Trait for providing declaration trees to extract from
pub trait TreeSources {
    /// Read and parse every tree. Bad dumps become warnings, not errors.
    fn load(self) -> Result<TreeLoad>;
}

fn parse_tree(path: PathBuf, content: &str) -> Result<LoadedTree, TreeWarning> {
    match DeclTree::from_json(content) {
        Ok(tree) => Ok(LoadedTree { path, tree }),
        Err(e) => Err(TreeWarning {
            file: path,
            reason: format!("{:#}", e),
        }),
    }
}

/// Read a dump from disk. A relative `directory` inside the dump is taken
/// relative to the dump's own location.
fn read_tree(path: PathBuf) -> Result<LoadedTree, TreeWarning> {
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let mut loaded = parse_tree(path, &content)?;
            if let (Some(directory), Some(parent)) =
                (loaded.tree.directory.as_ref(), loaded.path.parent())
                && directory.is_relative()
            {
                loaded.tree.directory = Some(parent.join(directory));
            }
            Ok(loaded)
        }
        Err(e) => Err(TreeWarning {
            file: path,
            reason: format!("Failed to read declaration tree: {}", e),
        }),
    }
}

fn gather(results: Vec<Result<LoadedTree, TreeWarning>>) -> TreeLoad {
    let mut load = TreeLoad::default();
    for result in results {
        match result {
            Ok(tree) => {
                debug!(
                    "Loaded declaration tree {} ({} top-level decls)",
                    tree.path.display(),
                    tree.tree.decls.len()
                );
                load.trees.push(tree);
            }
            Err(warning) => {
                warn!("Skipping declaration tree {}", warning);
                load.warnings.push(warning);
            }
        }
    }
    load
}

/// Trees from an explicit list of files
pub struct PathTrees(Vec<PathBuf>);

impl PathTrees {
    /// Create from an iterator of paths
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl TreeSources for PathTrees {
    fn load(self) -> Result<TreeLoad> {
        #[cfg(feature = "parallel")]
        let results = {
            use rayon::prelude::*;
            self.0.into_par_iter().map(read_tree).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results = self.0.into_iter().map(read_tree).collect();

        Ok(gather(results))
    }
}

/// In-memory trees (useful for testing)
pub struct MemoryTrees(Vec<(PathBuf, String)>);

impl MemoryTrees {
    /// Create empty memory trees
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a dump with its JSON content
    pub fn add(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.0.push((path.into(), content.into()));
        self
    }
}

impl Default for MemoryTrees {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSources for MemoryTrees {
    fn load(self) -> Result<TreeLoad> {
        let results = self
            .0
            .into_iter()
            .map(|(path, content)| parse_tree(path, &content))
            .collect();
        Ok(gather(results))
    }
}

/// Gitignore-aware directory walker for tree dumps
#[cfg(feature = "walk")]
pub struct WalkTrees {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

#[cfg(feature = "walk")]
impl WalkTrees {
    /// Create a walker for the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Add include patterns (e.g., `["build/**/*.ast.json"]`). Defaults to
    /// [`DEFAULT_TREE_PATTERN`] when none are given.
    pub fn include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns (e.g., `["third_party/**"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Matching files, sorted for stable output
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        use eyre::WrapErr;
        use ignore::WalkBuilder;

        let include = if self.include.is_empty() {
            build_globset(&[DEFAULT_TREE_PATTERN.to_string()])?
        } else {
            build_globset(&self.include)?
        };
        let exclude = build_globset(&self.exclude)?;

        let walker = WalkBuilder::new(&self.root)
            .follow_links(true)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.wrap_err_with(|| {
                format!("Failed to walk {}", self.root.display())
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let relative = relative.to_string_lossy().replace('\\', "/");
            if include.is_match(&relative) && !exclude.is_match(&relative) {
                found.push(path.to_path_buf());
            }
        }

        found.sort();
        Ok(found)
    }
}

#[cfg(feature = "walk")]
impl TreeSources for WalkTrees {
    fn load(self) -> Result<TreeLoad> {
        let paths = self.discover()?;
        debug!(
            "Found {} declaration trees under {}",
            paths.len(),
            self.root.display()
        );
        PathTrees::new(paths).load()
    }
}

#[cfg(feature = "walk")]
fn build_globset(patterns: &[String]) -> Result<globset::GlobSet> {
    use eyre::WrapErr;

    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(&pattern.replace('\\', "/"))
            .literal_separator(true)
            .build()
            .wrap_err_with(|| format!("Invalid glob pattern '{}'", pattern))?;
        builder.add(glob);
    }
    builder.build().wrap_err("Failed to build glob set")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{ "unit": "a.cpp", "decls": [] }"#;

    #[test]
    fn test_memory_trees() {
        let load = MemoryTrees::new()
            .add("a.ast.json", TREE)
            .add("broken.ast.json", "{")
            .add("b.ast.json", r#"{ "decls": [{ "kind": "namespace", "name": "N" }] }"#)
            .load()
            .unwrap();

        assert_eq!(load.trees.len(), 2);
        assert_eq!(load.trees[0].path, PathBuf::from("a.ast.json"));
        assert_eq!(load.trees[1].tree.decls.len(), 1);
        assert_eq!(load.warnings.len(), 1);
        assert_eq!(load.warnings[0].file, PathBuf::from("broken.ast.json"));
    }

    #[test]
    fn test_path_trees_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ["z", "a", "m"]
            .iter()
            .map(|name| {
                let path = dir.path().join(format!("{name}.ast.json"));
                std::fs::write(&path, TREE).unwrap();
                path
            })
            .collect();
        let missing = dir.path().join("missing.ast.json");

        let mut inputs = paths.clone();
        inputs.push(missing.clone());
        let load = PathTrees::new(inputs).load().unwrap();

        let loaded: Vec<PathBuf> = load.trees.iter().map(|t| t.path.clone()).collect();
        assert_eq!(loaded, paths);
        assert_eq!(load.warnings.len(), 1);
        assert_eq!(load.warnings[0].file, missing);
    }

    #[cfg(feature = "walk")]
    #[test]
    fn test_walk_trees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("build/sub")).unwrap();
        std::fs::create_dir_all(root.join("third_party")).unwrap();
        std::fs::write(root.join("build/b.ast.json"), TREE).unwrap();
        std::fs::write(root.join("build/sub/a.ast.json"), TREE).unwrap();
        std::fs::write(root.join("build/notes.json"), TREE).unwrap();
        std::fs::write(root.join("third_party/c.ast.json"), TREE).unwrap();

        let found = WalkTrees::new(root)
            .exclude(["third_party/**"])
            .discover()
            .unwrap();
        assert_eq!(
            found,
            vec![
                root.join("build/b.ast.json"),
                root.join("build/sub/a.ast.json")
            ]
        );

        let load = WalkTrees::new(root)
            .include(["third_party/*.json"])
            .load()
            .unwrap();
        assert_eq!(load.trees.len(), 1);
    }

    #[cfg(feature = "walk")]
    #[test]
    fn test_walk_trees_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WalkTrees::new(dir.path()).include(["a/{b"]).discover().is_err());
    }
}

//! Mapping declaration locations to project-relative paths

use crate::decl::SourceLocation;
use eyre::{Result, WrapErr};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Bucket key used for declarations whose location cannot be resolved
/// under [`UnresolvedPolicy::Sentinel`].
pub const UNRESOLVED_BUCKET: &str = "<unresolved>";

/// What to do with a declaration whose source location cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// File it under [`UNRESOLVED_BUCKET`]
    #[default]
    Sentinel,
    /// Drop it
    Skip,
}

impl FromStr for UnresolvedPolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sentinel" => Ok(UnresolvedPolicy::Sentinel),
            "skip" => Ok(UnresolvedPolicy::Skip),
            other => eyre::bail!(
                "Unknown unresolved-location policy '{}' (expected 'sentinel' or 'skip')",
                other
            ),
        }
    }
}

/// Resolves source locations to canonical paths relative to the project root.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
    policy: UnresolvedPolicy,
}

impl FileResolver {
    /// Create a resolver for an existing project root directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            eyre::bail!(
                "Project root {} does not exist or is not a directory",
                root.display()
            );
        }
        let root = root
            .canonicalize()
            .wrap_err_with(|| format!("Failed to canonicalize project root {}", root.display()))?;
        Ok(Self {
            root,
            policy: UnresolvedPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Canonical project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    /// Resolve a location to a `/`-separated path relative to the root.
    ///
    /// Relative location files are taken relative to `base_dir` (the tree's
    /// build directory), or the current directory if there is none. Files
    /// outside the root resolve to `..`-prefixed paths.
    pub fn resolve(
        &self,
        location: Option<&SourceLocation>,
        base_dir: Option<&Path>,
    ) -> Option<String> {
        let location = location?;
        if location.file.as_os_str().is_empty() {
            return None;
        }

        let absolute = if location.file.is_absolute() {
            location.file.clone()
        } else {
            match base_dir {
                Some(dir) if dir.is_absolute() => dir.join(&location.file),
                Some(dir) => std::env::current_dir().ok()?.join(dir).join(&location.file),
                None => std::env::current_dir().ok()?.join(&location.file),
            }
        };

        let canonical = weakly_canonical(&absolute);
        relative_to(&canonical, &self.root)
    }

    /// Bucket key for a declaration, applying the unresolved-location policy.
    ///
    /// Returns `None` only when the location is unresolvable and the policy is
    /// [`UnresolvedPolicy::Skip`].
    pub fn bucket_for(
        &self,
        location: Option<&SourceLocation>,
        base_dir: Option<&Path>,
    ) -> Option<String> {
        match self.resolve(location, base_dir) {
            Some(path) => Some(path),
            None => match self.policy {
                UnresolvedPolicy::Sentinel => Some(UNRESOLVED_BUCKET.to_string()),
                UnresolvedPolicy::Skip => {
                    debug!("skipping declaration at unresolvable location {:?}", location);
                    None
                }
            },
        }
    }
}

/// Canonicalize the longest existing prefix of `path` and append the rest,
/// so files that do not exist (yet) still get a stable absolute path.
///
/// Symlinks in the existing prefix are resolved before any `..` is applied;
/// only the non-existent remainder is normalized lexically.
pub fn weakly_canonical(path: &Path) -> PathBuf {
    for existing in path.ancestors() {
        if existing.as_os_str().is_empty() {
            break;
        }
        if let Ok(canonical) = existing.canonicalize() {
            // ancestors() only yields prefixes of path
            let rest = path.strip_prefix(existing).unwrap_or(Path::new(""));
            return lexical_normalize(&canonical.join(rest));
        }
    }
    lexical_normalize(path)
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `path` relative to `base`, both absolute and normalized, joined with `/`.
///
/// Returns `None` if the two share no root (different drive prefixes).
pub fn relative_to(path: &Path, base: &Path) -> Option<String> {
    let path_components: Vec<Component> = path.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    let common = path_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_components.len() {
        parts.push("..".to_string());
    }
    for component in &path_components[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if parts.is_empty() {
        Some(".".to_string())
    } else {
        Some(parts.join("/"))
    }
}

//! Configuration for metamark
//!
//! Config lives at `.config/metamark/config.json` relative to the project root,
//! or wherever `--config` points. Every field is optional; command-line flags
//! take precedence. Relative paths in the file are resolved against the
//! project root the file belongs to.

use eyre::{Result, WrapErr};
use facet::Facet;
use metamark_core::{DuplicatePolicy, UnresolvedPolicy};
use std::path::{Path, PathBuf};

/// Config location relative to the project root
pub const DEFAULT_CONFIG_PATH: &str = ".config/metamark/config.json";

/// Root configuration for metamark
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Project root, relative to the config's project directory
    #[facet(default)]
    pub root: Option<String>,

    /// Mark files, merged in order (later files win)
    #[facet(default)]
    pub marks: Vec<String>,

    /// Glob patterns selecting tree dumps under the root
    /// Defaults to ["**/*.ast.json"] if not specified
    #[facet(default)]
    pub include: Vec<String>,

    /// Glob patterns to exclude
    #[facet(default)]
    pub exclude: Vec<String>,

    /// Directory `.meta` files are written to
    #[facet(default)]
    pub output: Option<String>,

    /// "append" or "dedup"
    #[facet(default)]
    pub duplicates: Option<String>,

    /// "sentinel" or "skip"
    #[facet(default)]
    pub unresolved: Option<String>,
}

impl Config {
    /// Parse a config from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        facet_json::from_str(json).wrap_err("Failed to parse config JSON")
    }

    /// Load a config from a local file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config from {}", path.display()))?;
        Self::from_json(&content)
            .wrap_err_with(|| format!("Failed to parse config from {}", path.display()))
    }
}

/// The directory relative config paths are resolved against.
///
/// For a config at `<dir>/.config/metamark/config.json` that is `<dir>`; for
/// any other location it is the directory holding the file.
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new("."));
    if parent.ends_with(".config/metamark")
        && let Some(base) = parent.parent().and_then(Path::parent)
    {
        return base.to_path_buf();
    }
    parent.to_path_buf()
}

/// Values given on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub marks: Vec<PathBuf>,
    pub trees_dir: Option<PathBuf>,
    pub trees: Vec<PathBuf>,
    pub dedup: bool,
    pub skip_unresolved: bool,
}

/// Where the trees come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeInput {
    /// Explicit dump files
    Files(Vec<PathBuf>),
    /// Walk a directory with include/exclude patterns
    Walk {
        dir: PathBuf,
        include: Vec<String>,
        exclude: Vec<String>,
    },
}

/// Fully resolved settings for an extraction run
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub output: Option<PathBuf>,
    pub marks: Vec<PathBuf>,
    pub trees: TreeInput,
    pub duplicates: DuplicatePolicy,
    pub unresolved: UnresolvedPolicy,
}

impl Settings {
    /// Merge the config file (if any) with command-line overrides.
    ///
    /// An explicit `--config` must exist; the default location is optional.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let cwd = std::env::current_dir().wrap_err("Failed to get current directory")?;
        let search_root = overrides.root.clone().unwrap_or_else(|| cwd.clone());

        let (config, base) = match &overrides.config {
            Some(path) => (Config::load(path)?, config_base_dir(path)),
            None => {
                let path = search_root.join(DEFAULT_CONFIG_PATH);
                if path.is_file() {
                    (Config::load(&path)?, config_base_dir(&path))
                } else {
                    (Config::default(), search_root.clone())
                }
            }
        };

        let root = match (overrides.root, &config.root) {
            (Some(root), _) => root,
            (None, Some(root)) => base.join(root),
            (None, None) => base.clone(),
        };

        let output = overrides
            .output
            .or_else(|| config.output.as_ref().map(|o| base.join(o)));

        let marks = if overrides.marks.is_empty() {
            config.marks.iter().map(|m| base.join(m)).collect()
        } else {
            overrides.marks
        };

        let trees = if !overrides.trees.is_empty() {
            TreeInput::Files(overrides.trees)
        } else {
            TreeInput::Walk {
                dir: overrides.trees_dir.unwrap_or_else(|| root.clone()),
                include: config.include.clone(),
                exclude: config.exclude.clone(),
            }
        };

        let duplicates = if overrides.dedup {
            DuplicatePolicy::Dedup
        } else {
            match &config.duplicates {
                Some(policy) => policy.parse()?,
                None => DuplicatePolicy::default(),
            }
        };

        let unresolved = if overrides.skip_unresolved {
            UnresolvedPolicy::Skip
        } else {
            match &config.unresolved {
                Some(policy) => policy.parse()?,
                None => UnresolvedPolicy::default(),
            }
        };

        Ok(Settings {
            root,
            output,
            marks,
            trees,
            duplicates,
            unresolved,
        })
    }

    /// The output directory, which must already exist
    pub fn require_output(&self) -> Result<&Path> {
        let Some(output) = &self.output else {
            eyre::bail!("No output directory given (use --output or set `output` in the config)");
        };
        if !output.is_dir() {
            eyre::bail!(
                "Output directory {} does not exist or is not a directory",
                output.display()
            );
        }
        Ok(output.as_path())
    }
}

//! Writing `.meta` documents

use eyre::{Result, WrapErr};
use metamark_core::{ProjectMetaInfo, UNRESOLVED_BUCKET, serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// File name the sentinel bucket is written to
pub const UNRESOLVED_FILE: &str = "_unresolved.meta";

/// Where the document for a bucket goes: `<output>/<relative>.meta`.
///
/// Returns `None` for paths that would land outside `output` (absolute, or
/// containing `..`), such as headers outside the project root.
pub fn meta_path(output: &Path, relative: &str) -> Option<PathBuf> {
    if relative == UNRESOLVED_BUCKET {
        return Some(output.join(UNRESOLVED_FILE));
    }
    if relative.is_empty() {
        return None;
    }

    let path = Path::new(relative);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return None;
    }

    Some(output.join(format!("{relative}.meta")))
}

/// What [`write_project`] did
#[derive(Debug, Default)]
pub struct WriteSummary {
    /// Documents written, in bucket order
    pub written: Vec<PathBuf>,
    /// Buckets refused because they would escape the output directory
    pub refused: Vec<String>,
}

/// Write one document per non-empty bucket, creating parent directories.
pub fn write_project(
    project: ProjectMetaInfo,
    output: &Path,
    pretty: bool,
) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();

    for (relative, file) in project.into_non_empty() {
        let Some(target) = meta_path(output, &relative) else {
            warn!("Refusing to write metadata for {} outside the output directory", relative);
            summary.refused.push(relative);
            continue;
        };

        let json = if pretty {
            serialize::to_json_pretty(&file)?
        } else {
            serialize::to_json(&file)?
        };

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, json)
            .wrap_err_with(|| format!("Failed to write {}", target.display()))?;
        debug!("Wrote {}", target.display());
        summary.written.push(target);
    }

    Ok(summary)
}

//! Whole-project extraction over many declaration trees

use crate::decl::DeclTree;
use crate::location::FileResolver;
use crate::marks::MarkDatabase;
use crate::project::{DuplicatePolicy, ProjectMetaInfo};
use crate::walker::{TraversalReport, extract_tree};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// How passes landing in the same file bucket are combined
    pub duplicates: DuplicatePolicy,
}

/// Everything produced by [`extract_project`]
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    /// Non-empty buckets only
    pub project: ProjectMetaInfo,
    pub report: TraversalReport,
}

/// Traverse every tree and merge the results.
///
/// Each tree is walked into its own private accumulator (in parallel with the
/// `parallel` feature). Accumulators are merged in input order, so the output
/// does not depend on scheduling.
pub fn extract_project<T>(
    trees: &[T],
    marks: &MarkDatabase,
    resolver: &FileResolver,
    options: ExtractOptions,
) -> ExtractOutcome
where
    T: AsRef<DeclTree> + Sync,
{
    let walk_one = |tree: &T| {
        let mut project = ProjectMetaInfo::new();
        let report = extract_tree(tree.as_ref(), marks, resolver, &mut project);
        (project, report)
    };

    #[cfg(feature = "parallel")]
    let passes: Vec<(ProjectMetaInfo, TraversalReport)> = {
        use rayon::prelude::*;
        trees.par_iter().map(walk_one).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let passes: Vec<(ProjectMetaInfo, TraversalReport)> = trees.iter().map(walk_one).collect();

    let mut outcome = ExtractOutcome::default();
    for (project, report) in passes {
        outcome.project.merge(project, options.duplicates);
        outcome.report.merge(report);
    }
    outcome.project.prune_empty();

    info!(
        "Extracted {} entities into {} files from {} trees",
        outcome.report.entities(),
        outcome.project.len(),
        trees.len()
    );

    outcome
}

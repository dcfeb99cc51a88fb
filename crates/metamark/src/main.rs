//! metamark - Extract mark-selected metadata from C++ declaration trees
//!
//! metamark reads declaration-tree dumps produced by a C++ front-end, keeps the
//! declarations named in one or more mark files, and writes one `.meta` JSON
//! document per source file describing the selected records, variables,
//! functions and enums.

use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr};
use metamark::config::{Overrides, Settings, TreeInput};
use metamark::{outline, output, suggest};
use metamark_core::{
    DeclTree, ExtractOptions, FileResolver, MarkDatabase, PathTrees, TreeLoad, TreeSources,
    WalkTrees, extract_project,
};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "metamark", version)]
#[command(about = "Extract mark-selected metadata from C++ declaration trees")]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
enum Command {
    /// Extract metadata and write one .meta file per source file
    Extract(ExtractArgs),

    /// Print the merged mark map as JSON
    Marks {
        /// Mark files, merged in order (default: from config)
        #[arg(short, long)]
        marks: Vec<PathBuf>,

        /// Path to config file (default: <root>/.config/metamark/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project root
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Print an outline of a declaration tree, flagging selected declarations
    Dump {
        /// Declaration-tree dump to print
        tree: PathBuf,

        /// Mark files used to flag selected declarations
        #[arg(short, long)]
        marks: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Project root; output paths are relative to it
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Existing directory to write .meta files into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mark files, merged in order (later files win)
    #[arg(short, long)]
    marks: Vec<PathBuf>,

    /// Path to config file (default: <root>/.config/metamark/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to search for *.ast.json dumps (default: the root)
    #[arg(long)]
    trees_dir: Option<PathBuf>,

    /// Drop entities already emitted for the same file by another tree
    #[arg(long)]
    dedup: bool,

    /// Drop entities with unresolvable locations instead of writing _unresolved.meta
    #[arg(long)]
    skip_unresolved: bool,

    /// Indent the written JSON
    #[arg(long)]
    pretty: bool,

    /// Declaration-tree dumps to process (default: search the trees dir)
    trees: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Extract(args) => run_extract_command(args),
        Command::Marks {
            marks,
            config,
            root,
        } => run_marks_command(marks, config, root),
        Command::Dump { tree, marks } => run_dump_command(tree, marks),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("metamark=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metamark=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_extract_command(args: ExtractArgs) -> Result<()> {
    let settings = Settings::resolve(Overrides {
        config: args.config,
        root: args.root,
        output: args.output,
        marks: args.marks,
        trees_dir: args.trees_dir,
        trees: args.trees,
        dedup: args.dedup,
        skip_unresolved: args.skip_unresolved,
    })?;

    // Configuration problems abort before any traversal
    let output_dir = settings.require_output()?.to_path_buf();
    let resolver = FileResolver::new(&settings.root)?.with_policy(settings.unresolved);

    let marks = load_marks(&settings.marks);
    if marks.is_empty() {
        eprintln!(
            "   {} No marks loaded, nothing will be extracted",
            "!".yellow().bold()
        );
    }

    let trees = load_trees(&settings.trees)?;
    if trees.trees.is_empty() {
        eyre::bail!("No declaration trees to process");
    }

    eprintln!(
        "{} Extracting from {} trees...",
        "->".blue().bold(),
        trees.trees.len()
    );
    let outcome = extract_project(
        &trees.trees,
        &marks,
        &resolver,
        ExtractOptions {
            duplicates: settings.duplicates,
        },
    );

    let unmatched = outcome.report.unmatched(&marks);
    for entry in suggest::unmatched_with_suggestions(&unmatched, &outcome.report.considered) {
        match entry.suggestion {
            Some(suggestion) => eprintln!(
                "   {} Mark '{}' matched nothing (did you mean '{}'?)",
                "!".yellow().bold(),
                entry.key.red(),
                suggestion.green()
            ),
            None => eprintln!(
                "   {} Mark '{}' matched nothing",
                "!".yellow().bold(),
                entry.key.red()
            ),
        }
    }
    if outcome.report.skipped_unresolved > 0 {
        eprintln!(
            "   {} Skipped {} entities with unresolvable locations",
            "!".yellow().bold(),
            outcome.report.skipped_unresolved
        );
    }

    let entities = outcome.report.entities();
    let summary = output::write_project(outcome.project, &output_dir, args.pretty)?;
    for refused in &summary.refused {
        eprintln!(
            "   {} Not writing {} (outside the output directory)",
            "!".yellow().bold(),
            refused.red()
        );
    }

    eprintln!(
        "{} Wrote {} metadata files ({} entities) to {}",
        "->".blue().bold(),
        summary.written.len().to_string().green(),
        entities,
        output_dir.display()
    );

    Ok(())
}

fn run_marks_command(
    marks: Vec<PathBuf>,
    config: Option<PathBuf>,
    root: Option<PathBuf>,
) -> Result<()> {
    let settings = Settings::resolve(Overrides {
        config,
        root,
        marks,
        ..Overrides::default()
    })?;
    if settings.marks.is_empty() {
        eyre::bail!("No mark files specified. Usage: metamark marks --marks <file.json>...");
    }

    let marks = load_marks(&settings.marks);
    println!("{}", marks.to_json_pretty());
    Ok(())
}

fn run_dump_command(tree: PathBuf, marks: Vec<PathBuf>) -> Result<()> {
    let decls = DeclTree::load(&tree)?;
    let marks = load_marks(&marks);
    print!("{}", outline::render(&decls, &marks));
    Ok(())
}

fn load_marks(paths: &[PathBuf]) -> MarkDatabase {
    if !paths.is_empty() {
        eprintln!(
            "{} Loading {} mark files...",
            "->".blue().bold(),
            paths.len()
        );
    }
    let load = MarkDatabase::load(paths);
    for warning in &load.warnings {
        eprintln!("   {} {}", "!".yellow().bold(), warning);
    }
    load.marks
}

fn load_trees(input: &TreeInput) -> Result<TreeLoad> {
    let load = match input {
        TreeInput::Files(files) => PathTrees::new(files.iter().cloned()).load()?,
        TreeInput::Walk {
            dir,
            include,
            exclude,
        } => {
            eprintln!(
                "{} Searching {} for declaration trees...",
                "->".blue().bold(),
                dir.display()
            );
            WalkTrees::new(dir)
                .include(include.iter().cloned())
                .exclude(exclude.iter().cloned())
                .load()
                .wrap_err_with(|| format!("Failed to search {}", dir.display()))?
        }
    };

    for warning in &load.warnings {
        eprintln!("   {} Skipping {}", "!".yellow().bold(), warning);
    }
    Ok(load)
}

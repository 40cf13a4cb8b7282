use clap::{Parser, Subcommand};
use metablock::output::{self, BatchStats};
use metablock::preset::ProjectCache;
use metablock::{config, pipeline, scan};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let version = format_version(
        env!("CARGO_PKG_VERSION"),
        env!("METABLOCK_GIT_HASH"),
        env!("METABLOCK_RELEASE") == "true",
        env!("METABLOCK_DIRTY") == "true",
    );
    // Leaked once at startup, called exactly once
    Box::leak(version.into_boxed_str())
}

/// `--version` text: the crate version on a tagged release, otherwise
/// `dev@<hash>` with `+dirty` when tracked files had uncommitted changes.
fn format_version(pkg_version: &str, hash: &str, release: bool, dirty: bool) -> String {
    if release && !dirty {
        return pkg_version.to_string();
    }
    if hash.is_empty() {
        return "dev@unknown".to_string();
    }
    let suffix = if dirty { "+dirty" } else { "" };
    format!("dev@{hash}{suffix}")
}

#[derive(Parser)]
#[command(name = "metablock")]
#[command(about = "Delivery metadata generator for LTO tape hash-lists")]
#[command(long_about = "\
Delivery metadata generator for LTO tape hash-lists

Each .mhl hash-list is read, its paths decomposed into shoot days and rolls,
and the project's template filled in. The document is written next to the
hash-list.

Expected path layout inside a hash-list (levels configurable):

  KD0097/KINGDOM/DAILIES/ORIGINAL/KINGDOM_20240115-MU03/CAMERA/A001R1AB/A001C003.ari
                                  └─ day (4)            └─ 5   └─ roll (6)

Presets directory:

  presets/
  ├── config.toml      # Shared config (optional)
  ├── KD.toml          # Project config (optional, overrides shared)
  └── KD.txt           # Template, then <FORMAT MAPPING>, then regex,camera,format rows

The project is taken from the barcode's leading letters (KD0097 -> KD) unless
--project is given.

Run 'metablock gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding project presets and config.toml
    #[arg(long, default_value = "presets", global = true)]
    presets: PathBuf,

    /// Project id to use instead of the barcode prefix
    #[arg(long, global = true)]
    project: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate metadata documents for every hash-list found
    Build {
        /// .mhl files or directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Run the full pipeline without writing, report what needs fixing
    Check {
        /// .mhl files or directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the derived values for one hash-list as JSON
    Scan {
        /// The .mhl file
        path: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "metablock=debug"
    } else {
        "metablock=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut projects = ProjectCache::new(&cli.presets);
    let project = cli.project.as_deref();

    match cli.command {
        Command::Build { paths } => {
            let stats = run_batch(&paths, &mut projects, project, true);
            output::print_batch_footer(&stats);
            if stats.failed > 0 {
                return Err(format!("{} manifest(s) failed", stats.failed).into());
            }
        }
        Command::Check { paths } => {
            let stats = run_batch(&paths, &mut projects, project, false);
            output::print_batch_footer(&stats);
            if stats.failed > 0 {
                return Err(format!("{} manifest(s) failed", stats.failed).into());
            }
        }
        Command::Scan { path } => {
            let outcome = pipeline::run(&path, &mut projects, project)?;
            let report = serde_json::json!({
                "summary": outcome.summary,
                "mapping": outcome.mapping,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Process every manifest under `paths`. A failed manifest is reported and
/// the batch moves on.
fn run_batch(
    paths: &[PathBuf],
    projects: &mut ProjectCache,
    project: Option<&str>,
    write: bool,
) -> BatchStats {
    let manifests = scan::collect_manifests(paths);
    if manifests.is_empty() {
        tracing::warn!("no .mhl files found");
    }

    let mut stats = BatchStats::default();
    for (i, path) in manifests.iter().enumerate() {
        let index = i + 1;
        let result = pipeline::run(path, projects, project).and_then(|outcome| {
            let written = if write {
                let target = pipeline::write_document(path, &outcome)?;
                target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            } else {
                None
            };
            Ok((outcome, written))
        });

        match result {
            Ok((outcome, written)) => {
                output::print_outcome(index, path, &outcome, written.as_deref());
                stats.record(&outcome);
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "manifest failed");
                output::print_failure(index, path, &err);
                stats.record_failure();
            }
        }
    }
    stats
}

//! safe_extract CLI - policy-driven archive extraction
//!
//! # Examples
//!
//! ```bash
//! # Simple extraction
//! safe_extract archive.tar.gz -d /tmp/out
//!
//! # Drop the top-level directory and keep going past broken entries
//! safe_extract release.tar.xz -d /opt/app --strip-components 1 --on-error skip
//!
//! # Filter by pattern
//! safe_extract archive.zip -d /tmp/out --include "**/*.py" --exclude "**/test_*"
//!
//! # List contents without extracting
//! safe_extract archive.zip --list
//!
//! # Generate shell completions
//! safe_extract --completions bash > ~/.bash_completion.d/safe_extract
//! ```

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use safe_extract::{
    list_entries, Decision, Entry, EntryKind, Error, ExtractConfig, Report, SymlinkPolicy,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "safe_extract",
    about = "Policy-driven archive extraction - blocks path traversal and escaping symlinks",
    version,
    after_help = "EXAMPLES:
    safe_extract archive.zip -d /tmp/out
    safe_extract archive.tar.gz -d /tmp/out --strip-components 1
    safe_extract archive.zip -d /tmp/out --include '**/*.py'
    safe_extract archive.zip --list"
)]
struct Cli {
    /// Archive file to extract (TAR, TAR.GZ/BZ2/XZ/ZST, ZIP, 7Z, or a bare .gz/.bz2/.xz/.zst)
    #[arg(required_unless_present = "completions")]
    archive: Option<PathBuf>,

    /// Destination directory (created if missing)
    #[arg(short, long, default_value = ".")]
    dest: PathBuf,

    /// List contents without extracting
    #[arg(short, long)]
    list: bool,

    /// Generate shell completions for the specified shell
    #[arg(long, value_enum)]
    completions: Option<Shell>,

    /// Drop this many leading path components from every entry
    #[arg(long, value_name = "N", default_value_t = 0)]
    strip_components: usize,

    /// Replace files that already exist
    #[arg(long)]
    overwrite: bool,

    /// What to do with symlinks
    #[arg(long, value_enum, default_value_t = SymlinkMode::Disallow)]
    symlinks: SymlinkMode,

    /// What to do when an entry fails
    #[arg(long, value_enum, default_value_t = OnError::BailOut)]
    on_error: OnError,

    /// Extract only files matching glob patterns (can be repeated)
    #[arg(long = "include", value_name = "PATTERN")]
    include_patterns: Vec<String>,

    /// Exclude files matching glob patterns (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude_patterns: Vec<String>,

    /// Quiet mode - only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode - show each entry extracted
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SymlinkMode {
    /// Create links exactly as stored
    Allow,
    /// Refuse links that point outside the destination
    Disallow,
    /// Re-root absolute link targets under the destination
    Relativize,
}

impl From<SymlinkMode> for SymlinkPolicy {
    fn from(mode: SymlinkMode) -> Self {
        match mode {
            SymlinkMode::Allow => SymlinkPolicy::Allow,
            SymlinkMode::Disallow => SymlinkPolicy::Disallow,
            SymlinkMode::Relativize => SymlinkPolicy::RelativizeAbsolute,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OnError {
    /// Stop with the first error
    BailOut,
    /// Stop quietly at the first error, keeping what was extracted
    Abort,
    /// Skip the failed entry and continue
    Skip,
    /// Skip the failed entry and ignore every later failure
    SkipAll,
}

impl From<OnError> for Decision {
    fn from(mode: OnError) -> Self {
        match mode {
            OnError::BailOut => Decision::BailOut,
            OnError::Abort => Decision::Abort,
            OnError::Skip => Decision::Skip,
            OnError::SkipAll => Decision::SkipAll,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle completions generation
    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "safe_extract", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    setup_logging(cli.verbose, cli.quiet);

    let Some(archive) = cli.archive.as_deref() else {
        eprintln!("Error: an archive is required");
        return ExitCode::FAILURE;
    };

    let result = if cli.list {
        list_archive(archive, cli.quiet)
    } else {
        extract(&cli, archive)
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        // Extraction finished but some entries were abandoned.
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "safe_extract=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn extract(cli: &Cli, archive: &Path) -> Result<bool, Error> {
    let decision = Decision::from(cli.on_error);
    let mut builder = ExtractConfig::builder()
        .overwrite(cli.overwrite)
        .symlinks(cli.symlinks.into())
        .strip_components(cli.strip_components)
        .create_destination(true)
        .include_glob(cli.include_patterns.iter().cloned())
        .exclude_glob(cli.exclude_patterns.iter().cloned())
        .on_error(move |_: &Entry, _: &Error| decision);

    if cli.verbose {
        builder = builder.post_process(|entry, path| {
            println!("{} -> {}", entry.name(), path.display());
            Ok(())
        });
    }

    let report = safe_extract::extract_file(archive, &cli.dest, builder.build())?;

    if !cli.quiet {
        print_summary(&report, &cli.dest);
    }
    Ok(report.entries_failed == 0 && !report.aborted)
}

fn print_summary(report: &Report, dest: &Path) {
    println!(
        "Extracted {} files ({}) to {}",
        report.files_extracted,
        format_bytes(report.bytes_written),
        dest.display()
    );
    if report.dirs_created > 0 || report.symlinks_created > 0 {
        println!(
            "Created {} directories, {} symlinks",
            report.dirs_created, report.symlinks_created
        );
    }
    if report.entries_skipped > 0 {
        println!("Skipped {} entries", report.entries_skipped);
    }
    if report.entries_failed > 0 {
        println!("Failed {} entries", report.entries_failed);
    }
    if report.aborted {
        println!("Extraction aborted");
    }
}

fn list_archive(path: &Path, quiet: bool) -> Result<bool, Error> {
    let entries = list_entries(path)?;

    if !quiet {
        println!("{} entries in {}:", entries.len(), path.display());
        println!();
    }

    let mut total_size = 0u64;
    for entry in &entries {
        let size = entry.size().unwrap_or(0);
        let size_col = entry.size().map(format_bytes).unwrap_or_else(|| "-".into());
        match entry.kind() {
            EntryKind::File => println!("{:>10}  {}", size_col, entry.name()),
            EntryKind::Directory => println!("{:>10}  {}/", "", entry.name()),
            EntryKind::Symlink { target } => {
                println!("{:>10}  {} -> {}", "", entry.name(), target)
            }
        }
        total_size += size;
    }

    if !quiet {
        println!();
        println!("Total: {} entries, {}", entries.len(), format_bytes(total_size));
    }

    Ok(true)
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}G", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}M", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

fn format_error(e: &Error) -> String {
    match e {
        Error::PathTraversal { entry, detail } => {
            format!("Path traversal blocked in '{}': {}", entry, detail)
        }
        Error::InvalidSymlink { entry, reason } => {
            format!("Symlink '{}' refused: {}", entry, reason)
        }
        Error::MissingDependency { codec, feature } => {
            format!(
                "{} archives are not supported by this build (rebuild with --features {})",
                codec, feature
            )
        }
        _ => e.to_string(),
    }
}

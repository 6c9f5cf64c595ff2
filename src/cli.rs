use clap::Parser;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::convert::ConvertOptions;

/// Suffix of converted books.
pub const KEPUB_SUFFIX: &str = ".kepub.epub";

#[derive(Parser, Debug)]
#[command(name = "kepubify")]
#[command(version)]
#[command(about = "Convert EPUB books into Kobo kepubs", long_about = None)]
#[command(after_help = "Examples:\n  \
  kepubify book.epub              write book.kepub.epub to the current directory\n  \
  kepubify -d out -o library/     convert every epub in library/ into out/, replacing old copies\n  \
  kepubify -j 2 -q big.epub       convert with at most two content files at a time, quietly")]
pub struct Cli {
    /// EPUB files, or directories of them
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Write converted books into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Never overwrite existing files
    #[arg(short = 'n', conflicts_with = "overwrite")]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Transform at most N content files at once (default: processors + 1)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<NonZeroUsize>,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            overwrite: self.overwrite,
            parallelism: self.jobs.unwrap_or_else(ConvertOptions::default_parallelism),
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (0, 0) => "kepubify=info",
            (0, 1) => "kepubify=debug",
            (0, _) => "kepubify=trace",
            (1, _) => "kepubify=warn",
            _ => "kepubify=error",
        }
    }

    /// Where the kepub for `input` is written.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let name = output_name(input);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// `book.epub` becomes `book.kepub.epub`; names without an `.epub` suffix keep
/// their full name.
pub fn output_name(input: &Path) -> OsString {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.len().checked_sub(".epub".len()) {
        Some(split) if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(".epub") => {
            &name[..split]
        }
        _ => name.as_str(),
    };
    OsString::from(format!("{stem}{KEPUB_SUFFIX}"))
}

/// Whether `path` already names a converted book.
pub fn is_kepub(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(KEPUB_SUFFIX))
        .unwrap_or(false)
}

/// Whether `path` names an EPUB, converted or not.
pub fn is_epub(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
}

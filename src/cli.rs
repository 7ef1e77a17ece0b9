//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use bookfetch_core::{BookRequest, SelectionMode};

/// Find a book from a free-text query and download it.
///
/// Without `--index` the matching candidates are listed; repeat the same
/// command with `--index N` to download candidate N.
#[derive(Parser, Debug)]
#[command(name = "bookfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Free-text query (title, author, or both)
    pub query: String,

    /// Preferred file format: epub, pdf, mobi, azw3, djvu, fb2, txt, or any
    #[arg(short, long)]
    pub format: Option<String>,

    /// Catalog category tag (repeatable); `fiction` searches the fiction catalog
    #[arg(long = "category", value_name = "TAG")]
    pub categories: Vec<String>,

    /// Maximum number of candidates to list (1-100)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(i64).range(1..=100))]
    pub limit: Option<i64>,

    /// Candidate index to download (from a previous listing)
    #[arg(short, long)]
    pub index: Option<u32>,

    /// Download the first candidate when no index is given
    #[arg(long)]
    pub auto_select: bool,

    /// Open the saved file with the default application
    #[arg(long)]
    pub open: bool,

    /// Download timeout in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Directory downloaded books are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Attach the full error chain to failure output
    #[arg(long)]
    pub debug: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error log output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Builds the pipeline request; `default_limit` and `auto_open` come from config.
    #[must_use]
    pub fn to_request(&self, default_limit: usize, auto_open: bool) -> BookRequest {
        BookRequest {
            query: self.query.clone(),
            format: self.format.clone(),
            category: self.categories.clone(),
            result_limit: self
                .limit
                .or_else(|| i64::try_from(default_limit).ok()),
            selection_index: self.index.map(i64::from),
            auto_open: self.open || auto_open,
            timeout_ms: self.timeout_ms,
            debug: self.debug,
            selection_mode: self.auto_select.then_some(SelectionMode::AutoFirst),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_query_only_parses_successfully() {
        let args = Args::try_parse_from(["bookfetch", "Atomic Habits"]).unwrap();
        assert_eq!(args.query, "Atomic Habits");
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.index.is_none());
        assert!(args.categories.is_empty());
    }

    #[test]
    fn test_cli_missing_query_returns_error() {
        let err = Args::try_parse_from(["bookfetch"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["bookfetch", "q", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["bookfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_limit_out_of_range_rejected() {
        assert!(Args::try_parse_from(["bookfetch", "q", "--limit", "0"]).is_err());
        assert!(Args::try_parse_from(["bookfetch", "q", "--limit", "101"]).is_err());
        let args = Args::try_parse_from(["bookfetch", "q", "--limit", "100"]).unwrap();
        assert_eq!(args.limit, Some(100));
    }

    #[test]
    fn test_cli_zero_timeout_rejected() {
        assert!(Args::try_parse_from(["bookfetch", "q", "--timeout-ms", "0"]).is_err());
    }

    #[test]
    fn test_cli_repeated_categories() {
        let args = Args::try_parse_from([
            "bookfetch",
            "q",
            "--category",
            "fiction",
            "--category",
            "classics",
        ])
        .unwrap();
        assert_eq!(args.categories, vec!["fiction", "classics"]);
    }

    #[test]
    fn test_to_request_applies_config_defaults() {
        let args = Args::try_parse_from(["bookfetch", "Dune", "--format", "epub", "-i", "2"])
            .unwrap();
        let request = args.to_request(25, true);
        assert_eq!(request.query, "Dune");
        assert_eq!(request.format.as_deref(), Some("epub"));
        assert_eq!(request.result_limit, Some(25));
        assert_eq!(request.selection_index, Some(2));
        assert!(request.auto_open);
        assert!(request.selection_mode.is_none());
    }

    #[test]
    fn test_to_request_flags_override_config() {
        let args =
            Args::try_parse_from(["bookfetch", "Dune", "--limit", "3", "--auto-select"]).unwrap();
        let request = args.to_request(25, false);
        assert_eq!(request.result_limit, Some(3));
        assert_eq!(request.selection_mode, Some(SelectionMode::AutoFirst));
        assert!(!request.auto_open);
    }
}

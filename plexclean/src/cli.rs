//! Command line interface definition.

use clap::Parser;

/// Environment variable help appended to `--help`.
const ENV_HELP: &str = "\
Environment Variables:
  PLEX_URL                    Plex server URL (e.g., http://localhost:32400)
  PLEX_TOKEN                  Plex authentication token
  PLEX_DRY_RUN                Set to 'false' to execute (default: true)
  PLEX_NO_CONFIRM             Set to 'true' to skip confirmation prompts
  PLEX_DEBUG                  Set to 'true' to enable debug logging
  PLEX_DELETE_LABELS          Comma-separated labels whose collections are removed
  PLEX_DELETE_LABEL_PATTERNS  Comma-separated wildcard patterns (*, ?) for labels

Command line arguments take precedence over environment variables.";

/// Remove Plex collections that fail a label-based retention policy.
///
/// Collections without labels are always removed. Collections whose labels
/// match a delete label or pattern are removed too. All other collections
/// are kept.
#[derive(Parser, Debug, Default)]
#[command(name = "plexclean")]
#[command(author, version, about, long_about = None, after_help = ENV_HELP)]
pub struct Cli {
    /// Plex server URL (can also use PLEX_URL).
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Plex authentication token (can also use PLEX_TOKEN).
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Show what would be removed without removing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Actually remove collections (overrides --dry-run and PLEX_DRY_RUN).
    #[arg(long)]
    pub execute: bool,

    /// Don't ask for confirmation before removing collections.
    #[arg(long)]
    pub no_confirm: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Comma-separated labels whose collections are removed.
    #[arg(long, value_name = "LABELS")]
    pub delete_labels: Option<String>,

    /// Comma-separated wildcard patterns; matching labels mark a collection for removal.
    #[arg(long, value_name = "PATTERNS")]
    pub delete_label_patterns: Option<String>,
}

//! Run configuration resolved from flags and environment variables.
//!
//! Resolution happens once at startup. Flags always win over the
//! environment; the environment wins over defaults.

use std::fmt;

use crate::cli::Cli;
use crate::error::{PlexCleanError, Result};
use crate::formatter::mask_token;
use crate::retention::RetentionPolicy;

/// Server URL variable.
pub const ENV_URL: &str = "PLEX_URL";
/// Token variable.
pub const ENV_TOKEN: &str = "PLEX_TOKEN";
/// Dry-run variable; `false` disables dry-run.
pub const ENV_DRY_RUN: &str = "PLEX_DRY_RUN";
/// Confirmation variable; `true` disables the prompt.
pub const ENV_NO_CONFIRM: &str = "PLEX_NO_CONFIRM";
/// Debug logging variable.
pub const ENV_DEBUG: &str = "PLEX_DEBUG";
/// Exact delete labels variable.
pub const ENV_DELETE_LABELS: &str = "PLEX_DELETE_LABELS";
/// Delete label patterns variable.
pub const ENV_DELETE_LABEL_PATTERNS: &str = "PLEX_DELETE_LABEL_PATTERNS";

/// Where a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingSource {
    /// Command line flag.
    Flag,
    /// Environment variable.
    Environment,
    /// Built-in default.
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flag => "flag",
            Self::Environment => "environment variable",
            Self::Default => "default",
        })
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Server base URL.
    pub server_url: String,
    /// Auth token.
    pub token: String,
    /// Report only, never delete.
    pub dry_run: bool,
    /// Source of `dry_run`.
    pub dry_run_source: SettingSource,
    /// Prompt before deleting.
    pub confirm: bool,
    /// Source of `confirm`.
    pub confirm_source: SettingSource,
    /// Verbose logging.
    pub debug: bool,
    /// Compiled deletion rules.
    pub policy: RetentionPolicy,
}

impl RunConfig {
    /// Resolve configuration from parsed flags and an environment lookup.
    ///
    /// Empty environment values are treated as unset.
    ///
    /// # Errors
    ///
    /// Fails when the server URL or token is missing, or a label pattern is
    /// not a valid wildcard.
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.is_empty());

        let server_url = cli
            .server_url
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| lookup(ENV_URL))
            .ok_or(PlexCleanError::MissingSetting {
                flag: "--server-url",
                env: ENV_URL,
            })?;

        let token = cli
            .token
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| lookup(ENV_TOKEN))
            .ok_or(PlexCleanError::MissingSetting {
                flag: "--token",
                env: ENV_TOKEN,
            })?;

        let (dry_run, dry_run_source) = if cli.execute || cli.dry_run {
            (!cli.execute, SettingSource::Flag)
        } else if let Some(value) = lookup(ENV_DRY_RUN) {
            (!value.eq_ignore_ascii_case("false"), SettingSource::Environment)
        } else {
            (true, SettingSource::Default)
        };

        let (confirm, confirm_source) = if cli.no_confirm {
            (false, SettingSource::Flag)
        } else if let Some(value) = lookup(ENV_NO_CONFIRM) {
            (!value.eq_ignore_ascii_case("true"), SettingSource::Environment)
        } else {
            (true, SettingSource::Default)
        };

        let debug = cli.debug
            || lookup(ENV_DEBUG).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let labels = cli
            .delete_labels
            .clone()
            .or_else(|| lookup(ENV_DELETE_LABELS))
            .map(|v| parse_label_list(&v))
            .unwrap_or_default();

        let patterns = cli
            .delete_label_patterns
            .clone()
            .or_else(|| lookup(ENV_DELETE_LABEL_PATTERNS))
            .map(|v| parse_label_list(&v))
            .unwrap_or_default();

        Ok(Self {
            server_url,
            token,
            dry_run,
            dry_run_source,
            confirm,
            confirm_source,
            debug,
            policy: RetentionPolicy::new(labels, patterns)?,
        })
    }

    /// Resolve against the process environment.
    ///
    /// # Errors
    ///
    /// See [`RunConfig::resolve`].
    pub fn from_env(cli: &Cli) -> Result<Self> {
        Self::resolve(cli, |name| std::env::var(name).ok())
    }

    /// Log the resolved configuration and deletion rules.
    pub fn log_startup(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  Server URL: {}", self.server_url);
        tracing::info!("  Token: {}", mask_token(&self.token));
        tracing::info!("  Debug mode: {}", self.debug);
        tracing::info!(
            "  Mode: {} (from {})",
            if self.dry_run { "DRY RUN" } else { "EXECUTE" },
            self.dry_run_source
        );
        tracing::info!(
            "  Confirmation: {} (from {})",
            if self.confirm { "ENABLED" } else { "DISABLED" },
            self.confirm_source
        );
        tracing::info!("  Delete labels: {}", display_list(self.policy.labels()));
        tracing::info!("  Delete patterns: {}", display_list(self.policy.patterns()));

        if self.dry_run {
            tracing::info!("Running in DRY RUN mode - no collections will be removed");
            tracing::info!("Set {ENV_DRY_RUN}=false or use --execute to actually remove collections");
        } else {
            tracing::warn!("EXECUTE mode - collections WILL BE PERMANENTLY REMOVED!");
        }

        tracing::info!("Deletion rules:");
        tracing::info!("  - Always remove collections WITHOUT any labels");
        if !self.policy.labels().is_empty() {
            tracing::info!(
                "  - Remove collections WITH exact labels: {}",
                display_list(self.policy.labels())
            );
        }
        if !self.policy.patterns().is_empty() {
            tracing::info!(
                "  - Remove collections WITH labels matching patterns: {}",
                display_list(self.policy.patterns())
            );
        }
        if self.policy.has_no_label_rules() {
            tracing::info!("  - No additional label-based removal rules configured");
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Render a list for the startup banner.
fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        format!("[{}]", items.join(", "))
    }
}

//! Output formatting utilities.

use colored::Colorize;

use crate::executor::{LibraryOutcome, LibraryReport, RunSummary};

/// Width of section separators.
const RULE_WIDTH: usize = 60;

/// Replace all but the last four characters of a token with `*`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "*".repeat(hidden))
}

/// Short token preview: first eight and last four characters.
///
/// Tokens of twelve characters or fewer are fully masked.
pub fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Horizontal separator line.
pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Title wrapped in separators, e.g. `==== LIBRARY 1/3 ====`.
pub fn banner(title: &str) -> String {
    let side = "=".repeat(20);
    format!("{side} {title} {side}")
}

/// Render the end-of-run summary.
pub fn format_summary(summary: &RunSummary, dry_run: bool) -> String {
    let mut lines = Vec::new();

    let title = if dry_run {
        "DRY RUN COMPLETE - SUMMARY".cyan().bold()
    } else {
        "CLEANUP COMPLETE - SUMMARY".green().bold()
    };
    lines.push(rule());
    lines.push(title.to_string());
    lines.push(rule());

    lines.push(format!("Libraries processed: {}", summary.libraries_processed));
    if summary.libraries_failed > 0 {
        lines.push(format!(
            "Libraries skipped after errors: {}",
            summary.libraries_failed.to_string().red()
        ));
    }
    if summary.libraries_cancelled > 0 {
        lines.push(format!(
            "Libraries cancelled at prompt: {}",
            summary.libraries_cancelled.to_string().yellow()
        ));
    }
    lines.push(format!(
        "Total collections found: {}",
        summary.total_collections
    ));

    if dry_run {
        lines.push(format!(
            "Collections that would be removed: {}",
            summary.removed
        ));
        lines.push(format!(
            "Collections that would remain: {}",
            summary.remaining()
        ));
        lines.push(String::new());
        lines.push(
            "To actually remove collections, run with --execute"
                .dimmed()
                .to_string(),
        );
    } else {
        lines.push(format!(
            "Collections successfully removed: {}",
            summary.removed
        ));
        if summary.failed_deletions > 0 {
            lines.push(format!(
                "Collections that failed to delete: {}",
                summary.failed_deletions.to_string().red()
            ));
        }
        lines.push(format!("Collections remaining: {}", summary.remaining()));
    }
    if summary.skipped_collections > 0 {
        lines.push(format!(
            "Collections skipped after errors: {}",
            summary.skipped_collections.to_string().red()
        ));
    }

    if !summary.libraries.is_empty() {
        lines.push(String::new());
        lines.push("Per library:".bold().to_string());
        lines.extend(summary.libraries.iter().map(library_line));
    }
    lines.push(rule());

    lines.join("\n")
}

/// One summary line for a library, e.g. `  Movies: 3 collections, removed 2`.
fn library_line(report: &LibraryReport) -> String {
    let outcome = match &report.outcome {
        LibraryOutcome::Failed(error) => format!("failed: {error}").red().to_string(),
        LibraryOutcome::Clean => "nothing to remove".to_string(),
        LibraryOutcome::WouldRemove(n) => format!("would remove {n}"),
        LibraryOutcome::Cancelled => "cancelled".yellow().to_string(),
        LibraryOutcome::Removed { removed, failed: 0 } => format!("removed {removed}"),
        LibraryOutcome::Removed { removed, failed } => {
            format!("removed {removed}, {} failed", failed.to_string().red())
        }
    };

    let skipped = if report.skipped > 0 {
        format!(", {} skipped", report.skipped)
    } else {
        String::new()
    };

    format!(
        "  {}: {} collections, {outcome}{skipped}",
        report.title, report.collections
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefgh1234"), "********1234");
        assert_eq!(mask_token("abc"), "abc");
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...mnop");
        assert_eq!(token_preview("short"), "*****");
    }

    #[test]
    fn test_banner() {
        assert_eq!(
            banner("LIBRARY 1/2"),
            format!("{0} LIBRARY 1/2 {0}", "=".repeat(20))
        );
    }

    #[test]
    fn test_format_summary_dry_run() {
        colored::control::set_override(false);
        let summary = RunSummary {
            libraries_processed: 2,
            total_collections: 5,
            removed: 3,
            ..RunSummary::default()
        };
        let text = format_summary(&summary, true);
        assert!(text.contains("DRY RUN COMPLETE"));
        assert!(text.contains("Collections that would be removed: 3"));
        assert!(text.contains("Collections that would remain: 2"));
        assert!(!text.contains("failed to delete"));
    }

    #[test]
    fn test_format_summary_execute_with_failures() {
        colored::control::set_override(false);
        let summary = RunSummary {
            libraries_processed: 1,
            total_collections: 4,
            removed: 1,
            failed_deletions: 1,
            ..RunSummary::default()
        };
        let text = format_summary(&summary, false);
        assert!(text.contains("CLEANUP COMPLETE"));
        assert!(text.contains("Collections successfully removed: 1"));
        assert!(text.contains("Collections that failed to delete: 1"));
        assert!(text.contains("Collections remaining: 3"));
    }

    #[test]
    fn test_format_summary_lists_each_library() {
        colored::control::set_override(false);
        let report = |title: &str, collections, skipped, outcome| LibraryReport {
            title: title.into(),
            collections,
            skipped,
            outcome,
        };
        let summary = RunSummary {
            libraries_processed: 4,
            libraries_failed: 1,
            libraries_cancelled: 1,
            total_collections: 9,
            removed: 2,
            failed_deletions: 1,
            skipped_collections: 1,
            libraries: vec![
                report("Movies", 5, 1, LibraryOutcome::Removed { removed: 2, failed: 1 }),
                report("Shows", 4, 0, LibraryOutcome::Cancelled),
                report("Music", 0, 0, LibraryOutcome::Failed("timed out".into())),
                report("Photos", 0, 0, LibraryOutcome::Clean),
            ],
        };
        let text = format_summary(&summary, false);
        assert!(text.contains("Per library:"));
        assert!(text.contains("  Movies: 5 collections, removed 2, 1 failed, 1 skipped"));
        assert!(text.contains("  Shows: 4 collections, cancelled"));
        assert!(text.contains("  Music: 0 collections, failed: timed out"));
        assert!(text.contains("  Photos: 0 collections, nothing to remove"));
        assert!(text.contains("Collections skipped after errors: 1"));
    }

    #[test]
    fn test_format_summary_dry_run_library_line() {
        colored::control::set_override(false);
        let summary = RunSummary {
            libraries_processed: 1,
            total_collections: 3,
            removed: 2,
            libraries: vec![LibraryReport {
                title: "Movies".into(),
                collections: 3,
                skipped: 0,
                outcome: LibraryOutcome::WouldRemove(2),
            }],
            ..RunSummary::default()
        };
        let text = format_summary(&summary, true);
        assert!(text.contains("  Movies: 3 collections, would remove 2"));
        assert!(!text.contains("skipped"));
    }
}

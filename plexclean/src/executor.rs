//! Cleanup execution across all libraries.
//!
//! Each library is analyzed, reported and then, outside dry-run, its marked
//! collections are deleted one by one. A failure in one library or one
//! deletion never stops the rest of the run.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::error::Result;
use crate::formatter::{banner, rule};
use crate::retention::RetentionPolicy;
use crate::server::{LibrarySection, MediaServer};
use crate::walker::{LibraryAnalysis, analyze_library};

/// Keyword the operator must type to allow deletions.
pub const CONFIRM_KEYWORD: &str = "DELETE";

/// Asks the operator whether a library's deletions may proceed.
pub trait Confirmer {
    /// Return the operator's answer for one library.
    ///
    /// # Errors
    ///
    /// Fails if input cannot be read.
    fn confirm(&mut self, library: &LibrarySection, pending: usize) -> Result<bool>;
}

impl<C: Confirmer + ?Sized> Confirmer for &mut C {
    fn confirm(&mut self, library: &LibrarySection, pending: usize) -> Result<bool> {
        (**self).confirm(library, pending)
    }
}

/// Write the prompt to a writer, read the answer from a line reader.
#[derive(Debug)]
pub struct LinePrompt<R, W> {
    /// Source of operator input.
    input: R,
    /// Where the prompt is written.
    output: W,
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on standard output, reading from standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    /// Prompt written to `output`, answers read from `input`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompt and return its writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Confirmer for LinePrompt<R, W> {
    fn confirm(&mut self, library: &LibrarySection, pending: usize) -> Result<bool> {
        tracing::warn!(
            "About to PERMANENTLY DELETE {pending} collections from '{}'!",
            library.title
        );

        write!(
            self.output,
            "{} Type '{CONFIRM_KEYWORD}' to confirm: ",
            "Proceed with deletion?".yellow().bold()
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(is_confirmation(&answer))
    }
}

/// Whether an input line is exactly the confirmation keyword.
///
/// Only the line terminator is stripped.
pub fn is_confirmation(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == CONFIRM_KEYWORD
}

/// What happened to one library.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LibraryOutcome {
    /// Listing or analysis failed; nothing was deleted.
    Failed(String),
    /// No collection needed removing.
    Clean,
    /// Dry run: collections that would be removed.
    WouldRemove(usize),
    /// Operator declined the prompt.
    Cancelled,
    /// Deletions attempted.
    Removed {
        /// Successful deletions.
        removed: usize,
        /// Failed deletions.
        failed: usize,
    },
}

/// Per-library record kept in the summary.
#[derive(Debug, Clone)]
pub struct LibraryReport {
    /// Library title.
    pub title: String,
    /// Collections seen.
    pub collections: usize,
    /// Collections skipped because their labels were unreadable.
    pub skipped: usize,
    /// Outcome.
    pub outcome: LibraryOutcome,
}

/// Totals for the whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Libraries visited.
    pub libraries_processed: usize,
    /// Libraries skipped because listing failed.
    pub libraries_failed: usize,
    /// Libraries where the operator declined.
    pub libraries_cancelled: usize,
    /// Collections seen across all libraries.
    pub total_collections: usize,
    /// Collections removed, or that would be removed in dry-run.
    pub removed: usize,
    /// Deletions that failed.
    pub failed_deletions: usize,
    /// Collections skipped because their labels were unreadable.
    pub skipped_collections: usize,
    /// Per-library details, in server order.
    pub libraries: Vec<LibraryReport>,
}

impl RunSummary {
    /// Collections still on the server after the run.
    pub const fn remaining(&self) -> usize {
        self.total_collections.saturating_sub(self.removed)
    }

    /// Fold one library's result into the totals.
    fn record(
        &mut self,
        title: &str,
        collections: usize,
        skipped: usize,
        outcome: LibraryOutcome,
    ) {
        self.total_collections += collections;
        self.skipped_collections += skipped;
        match &outcome {
            LibraryOutcome::Failed(_) => self.libraries_failed += 1,
            LibraryOutcome::Cancelled => self.libraries_cancelled += 1,
            LibraryOutcome::WouldRemove(n) => self.removed += n,
            LibraryOutcome::Removed { removed, failed } => {
                self.removed += removed;
                self.failed_deletions += failed;
            }
            LibraryOutcome::Clean => {}
        }
        self.libraries.push(LibraryReport {
            title: title.to_string(),
            collections,
            skipped,
            outcome,
        });
    }
}

/// Drives analysis and deletion over every library on a server.
#[derive(Debug)]
pub struct Executor<'a, C> {
    /// Deletion rules.
    policy: &'a RetentionPolicy,
    /// Report only.
    dry_run: bool,
    /// Prompt before deleting; `None` disables confirmation.
    confirmer: Option<C>,
}

impl<'a, C: Confirmer> Executor<'a, C> {
    /// Create an executor. Pass `None` as `confirmer` to skip prompts.
    pub const fn new(policy: &'a RetentionPolicy, dry_run: bool, confirmer: Option<C>) -> Self {
        Self {
            policy,
            dry_run,
            confirmer,
        }
    }

    /// Process every library on the server.
    ///
    /// # Errors
    ///
    /// Fails if the libraries cannot be listed or if the confirmation
    /// prompt cannot read its input or write its output. Per-library and
    /// per-collection server failures are logged and counted in the summary.
    pub fn run<S: MediaServer + ?Sized>(&mut self, server: &S) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        tracing::info!("{}", rule());
        tracing::info!("STARTING COLLECTION CLEANUP PROCESS");
        tracing::info!("{}", rule());

        tracing::info!("Fetching library information...");
        let libraries = server.libraries()?;
        tracing::info!("Found {} libraries on server", libraries.len());

        if libraries.is_empty() {
            tracing::warn!("No libraries found on server!");
            return Ok(summary);
        }

        tracing::info!("Available libraries:");
        for (i, library) in libraries.iter().enumerate() {
            tracing::info!("  {}. {} ({})", i + 1, library.title, library.kind);
        }

        let total = libraries.len();
        for (i, library) in libraries.iter().enumerate() {
            summary.libraries_processed += 1;
            tracing::info!("{}", banner(&format!("LIBRARY {}/{total}", i + 1)));

            match analyze_library(server, library, self.policy) {
                Ok(analysis) => {
                    let outcome = self.process(server, &analysis)?;
                    summary.record(
                        &library.title,
                        analysis.total(),
                        analysis.skipped.len(),
                        outcome,
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Error getting collections from library '{}': {e}",
                        library.title
                    );
                    summary.record(&library.title, 0, 0, LibraryOutcome::Failed(e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Report and, outside dry-run, delete one library's marked collections.
    fn process<S: MediaServer + ?Sized>(
        &mut self,
        server: &S,
        analysis: &LibraryAnalysis,
    ) -> Result<LibraryOutcome> {
        let title = &analysis.library.title;
        let pending = &analysis.to_remove;

        if pending.is_empty() {
            tracing::info!("No collections to remove found in library '{title}' - skipping");
            return Ok(LibraryOutcome::Clean);
        }

        tracing::info!("Found {} collections to remove:", pending.len());
        for (i, c) in pending.iter().enumerate() {
            tracing::info!("  {}. {}", i + 1, c.entry.title);
        }

        if self.dry_run {
            tracing::info!(
                "DRY RUN: Would remove {} collections from '{title}'",
                pending.len()
            );
            return Ok(LibraryOutcome::WouldRemove(pending.len()));
        }

        if let Some(confirmer) = self.confirmer.as_mut()
            && !confirmer.confirm(&analysis.library, pending.len())?
        {
            tracing::info!("Skipping library '{title}' - user cancelled");
            return Ok(LibraryOutcome::Cancelled);
        }

        tracing::info!("Removing collections from '{title}'...");
        let mut removed = 0;
        let mut failed = 0;
        for (i, c) in pending.iter().enumerate() {
            tracing::info!("[{}/{}] Removing: {}", i + 1, pending.len(), c.entry.title);
            match server.delete_collection(&c.entry) {
                Ok(()) => {
                    removed += 1;
                    tracing::info!("Successfully removed: {}", c.entry.title);
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("Failed to remove collection '{}': {e}", c.entry.title);
                }
            }
        }

        Ok(LibraryOutcome::Removed { removed, failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn library() -> LibrarySection {
        LibrarySection {
            key: "1".into(),
            title: "Movies".into(),
            kind: "movie".into(),
        }
    }

    #[test]
    fn test_is_confirmation_exact() {
        assert!(is_confirmation("DELETE\n"));
        assert!(is_confirmation("DELETE\r\n"));
        assert!(is_confirmation("DELETE"));
        assert!(!is_confirmation("delete\n"));
        assert!(!is_confirmation(" DELETE\n"));
        assert!(!is_confirmation("DELETE \n"));
        assert!(!is_confirmation("\n"));
    }

    #[test]
    fn test_line_prompt_reads_answers_in_order() {
        let mut prompt = LinePrompt::new(Cursor::new("DELETE\nno\n"), Vec::new());
        assert!(prompt.confirm(&library(), 2).unwrap());
        assert!(!prompt.confirm(&library(), 2).unwrap());
        // EOF reads as an empty answer.
        assert!(!prompt.confirm(&library(), 2).unwrap());
    }

    #[test]
    fn test_line_prompt_writes_to_its_output() {
        colored::control::set_override(false);
        let mut prompt = LinePrompt::new(Cursor::new("DELETE\n"), Vec::new());
        assert!(prompt.confirm(&library(), 3).unwrap());

        let written = String::from_utf8(prompt.into_output()).unwrap();
        assert_eq!(written, "Proceed with deletion? Type 'DELETE' to confirm: ");
    }

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::default();
        summary.record("A", 3, 0, LibraryOutcome::WouldRemove(2));
        summary.record("B", 0, 0, LibraryOutcome::Failed("boom".into()));
        summary.record("C", 4, 1, LibraryOutcome::Removed { removed: 1, failed: 1 });
        summary.record("D", 2, 0, LibraryOutcome::Cancelled);

        assert_eq!(summary.total_collections, 9);
        assert_eq!(summary.removed, 3);
        assert_eq!(summary.failed_deletions, 1);
        assert_eq!(summary.libraries_failed, 1);
        assert_eq!(summary.libraries_cancelled, 1);
        assert_eq!(summary.remaining(), 6);
        assert_eq!(summary.skipped_collections, 1);
        assert_eq!(summary.libraries.len(), 4);
        assert_eq!(summary.libraries[2].skipped, 1);
    }
}

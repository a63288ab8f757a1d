//! plexclean - Plex collection cleanup
//!
//! Walks every library on a Plex server and removes collections that fail a
//! label-based retention policy.
//!
//! ## Rules
//!
//! - Collections without any labels are always removed
//! - Collections with a label equal to a delete label are removed
//! - Collections with a label matching a delete pattern (`*`, `?`) are removed
//! - Everything else is kept
//!
//! Runs are dry by default; deletions require `--execute` or
//! `PLEX_DRY_RUN=false` and, unless disabled, typing `DELETE` per library.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod plex;
pub mod retention;
pub mod server;
pub mod walker;

pub use cli::Cli;
pub use config::{RunConfig, SettingSource};
pub use error::{PlexCleanError, Result};
pub use executor::{
    Confirmer, Executor, LibraryOutcome, LibraryReport, LinePrompt, RunSummary,
};
pub use plex::PlexClient;
pub use retention::{Decision, Reason, RetentionPolicy};
pub use server::{
    CollectionEntry, LibrarySection, ListedCollection, MediaServer, ServerIdentity,
};
pub use walker::{ItemCount, LibraryAnalysis, analyze_library};

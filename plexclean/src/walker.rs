//! Per-library collection analysis.

use std::fmt;

use crate::error::Result;
use crate::retention::{Reason, RetentionPolicy};
use crate::server::{CollectionEntry, LibrarySection, ListedCollection, MediaServer};

/// Member count of a collection, if the server reported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemCount {
    /// Count returned by the server.
    Known(usize),
    /// Lookup failed.
    Unknown,
}

impl fmt::Display for ItemCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{n}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// A collection together with its retention verdict.
#[derive(Debug, Clone)]
pub struct AnalyzedCollection {
    /// Collection as listed by the server.
    pub entry: CollectionEntry,
    /// Member count for reporting.
    pub item_count: ItemCount,
    /// Rule that decided the verdict.
    pub reason: Reason,
}

/// Result of walking one library.
#[derive(Debug, Clone)]
pub struct LibraryAnalysis {
    /// Library that was analyzed.
    pub library: LibrarySection,
    /// Collections marked for removal, in server order.
    pub to_remove: Vec<AnalyzedCollection>,
    /// Collections that stay.
    pub to_keep: Vec<AnalyzedCollection>,
    /// Titles of collections skipped because their labels were unreadable.
    pub skipped: Vec<String>,
}

impl LibraryAnalysis {
    /// Number of collections seen in the library.
    pub fn total(&self) -> usize {
        self.to_remove.len() + self.to_keep.len() + self.skipped.len()
    }
}

/// List a library's collections and apply the retention policy to each.
///
/// Item counts are informational; a failed lookup is logged and reported
/// as [`ItemCount::Unknown`]. Collections with unreadable labels are logged
/// and skipped, so they are neither kept nor removed.
///
/// # Errors
///
/// Returns an error if the library's collections cannot be listed.
pub fn analyze_library<S: MediaServer + ?Sized>(
    server: &S,
    library: &LibrarySection,
    policy: &RetentionPolicy,
) -> Result<LibraryAnalysis> {
    tracing::info!("Analyzing library: {}", library.title);
    tracing::info!("Library type: {}", library.kind);

    tracing::debug!("Fetching collections from library...");
    let collections = server.collections(library)?;
    tracing::info!(
        "Found {} total collections in library '{}'",
        collections.len(),
        library.title
    );

    let mut analysis = LibraryAnalysis {
        library: library.clone(),
        to_remove: Vec::new(),
        to_keep: Vec::new(),
        skipped: Vec::new(),
    };

    if collections.is_empty() {
        tracing::info!("No collections found in this library");
        return Ok(analysis);
    }

    let total = collections.len();
    for (i, listed) in collections.into_iter().enumerate() {
        let index = i + 1;
        tracing::debug!("[{index}/{total}] Processing: {}", listed.title());

        let entry = match listed {
            ListedCollection::Ready(entry) => entry,
            ListedCollection::Unreadable { title, error } => {
                tracing::error!("[{index}] Error checking collection '{title}': {error}");
                analysis.skipped.push(title);
                continue;
            }
        };

        let item_count = match server.item_count(&entry) {
            Ok(n) => ItemCount::Known(n),
            Err(e) => {
                tracing::debug!("Could not get item count for '{}': {e}", entry.title);
                ItemCount::Unknown
            }
        };

        let decision = policy.decide(&entry.labels);
        if decision.remove {
            tracing::info!(
                "[{index}] '{}' ({item_count} items) - {} -> MARKED FOR REMOVAL",
                entry.title,
                decision.reason
            );
        } else {
            tracing::info!(
                "[{index}] '{}' ({item_count} items) - {} -> KEEPING",
                entry.title,
                decision.reason
            );
        }

        let analyzed = AnalyzedCollection {
            entry,
            item_count,
            reason: decision.reason,
        };
        if decision.remove {
            analysis.to_remove.push(analyzed);
        } else {
            analysis.to_keep.push(analyzed);
        }
    }

    tracing::info!("Summary for '{}':", library.title);
    tracing::info!("  Total collections: {}", analysis.total());
    tracing::info!("  Collections to keep: {}", analysis.to_keep.len());
    tracing::info!("  Collections to remove: {}", analysis.to_remove.len());
    if !analysis.skipped.is_empty() {
        tracing::info!("  Collections skipped (errors): {}", analysis.skipped.len());
    }

    Ok(analysis)
}

//! Remote media-server abstraction.
//!
//! The cleanup pipeline only needs a handful of server operations. They are
//! described by [`MediaServer`] so the walker and executor can run against
//! the Plex HTTP adapter or an in-memory fake.

use crate::error::{PlexCleanError, Result};

/// Server identity reported after connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    /// Friendly server name.
    pub name: String,
    /// Server version string.
    pub version: String,
    /// Operating system platform.
    pub platform: String,
    /// Platform version.
    pub platform_version: String,
}

/// A library section on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySection {
    /// Server-side key used in request paths.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Section type, e.g. `movie` or `show`.
    pub kind: String,
}

/// A collection inside a library section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    /// Server-side rating key.
    pub rating_key: String,
    /// Display title.
    pub title: String,
    /// Label tags attached to the collection.
    pub labels: Vec<String>,
}

/// One entry of a collection listing.
///
/// A collection whose labels could not be read is reported instead of
/// failing the whole listing; it must never be deleted.
#[derive(Debug)]
#[non_exhaustive]
pub enum ListedCollection {
    /// Collection with its labels resolved.
    Ready(CollectionEntry),
    /// Labels could not be read.
    Unreadable {
        /// Display title.
        title: String,
        /// Why the lookup failed.
        error: PlexCleanError,
    },
}

impl ListedCollection {
    /// The resolved entry, if labels were read.
    pub const fn entry(&self) -> Option<&CollectionEntry> {
        match self {
            Self::Ready(entry) => Some(entry),
            Self::Unreadable { .. } => None,
        }
    }

    /// Display title.
    pub fn title(&self) -> &str {
        match self {
            Self::Ready(entry) => &entry.title,
            Self::Unreadable { title, .. } => title,
        }
    }
}

impl From<CollectionEntry> for ListedCollection {
    fn from(entry: CollectionEntry) -> Self {
        Self::Ready(entry)
    }
}

/// Operations the cleanup needs from a connected server session.
pub trait MediaServer {
    /// Identity captured when the session was established.
    fn identity(&self) -> &ServerIdentity;

    /// List all library sections.
    fn libraries(&self) -> Result<Vec<LibrarySection>>;

    /// List every collection in a library, labels included.
    ///
    /// Fails only when the listing itself fails. A per-collection label
    /// lookup failure yields [`ListedCollection::Unreadable`].
    fn collections(&self, library: &LibrarySection) -> Result<Vec<ListedCollection>>;

    /// Number of items in a collection.
    fn item_count(&self, collection: &CollectionEntry) -> Result<usize>;

    /// Delete a collection from the server.
    fn delete_collection(&self, collection: &CollectionEntry) -> Result<()>;
}

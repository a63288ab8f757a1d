//! Error types for plexclean.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, PlexCleanError>;

/// Errors raised while resolving configuration or talking to the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlexCleanError {
    /// A required setting was supplied neither as a flag nor in the environment.
    #[error("missing required setting: pass {flag} or set {env}")]
    MissingSetting {
        /// Command line flag.
        flag: &'static str,
        /// Environment variable.
        env: &'static str,
    },

    /// Server URL could not be parsed or uses an unsupported scheme.
    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl {
        /// URL as given.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A delete-label pattern is not a valid wildcard.
    #[error("invalid label pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as given.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// Server rejected the token.
    #[error("unauthorized (401) requesting {path}")]
    Unauthorized {
        /// Request path.
        path: String,
    },

    /// Server answered 404.
    #[error("not found (404) requesting {path}")]
    NotFound {
        /// Request path.
        path: String,
    },

    /// Any other non-success status.
    #[error("server returned {status} for {path}: {body}")]
    Http {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Request timed out.
    #[error("request to {path} timed out")]
    Timeout {
        /// Request path.
        path: String,
    },

    /// Server could not be reached.
    #[error("could not reach server at {url}: {source}")]
    Unreachable {
        /// Full request URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        /// Request path.
        path: String,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading operator input failed.
    #[error("failed to read confirmation: {0}")]
    Prompt(#[from] std::io::Error),
}

impl PlexCleanError {
    /// Troubleshooting hint for connection failures, if one applies.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized { .. } => Some("401 Unauthorized - check your Plex token"),
            Self::NotFound { .. } => Some("404 Not Found - check your server URL"),
            Self::Timeout { .. } => Some("Connection timeout - check network/firewall"),
            Self::Unreachable { .. } => Some("Server unreachable - check that Plex is running"),
            Self::InvalidUrl { .. } => Some("Use a URL like http://localhost:32400"),
            _ => None,
        }
    }
}

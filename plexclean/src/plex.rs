//! Blocking HTTP adapter for the Plex Media Server API.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use crate::error::{PlexCleanError, Result};
use crate::server::{
    CollectionEntry, LibrarySection, ListedCollection, MediaServer, ServerIdentity,
};

/// Default plex.tv account endpoint.
pub const PLEX_TV_USER_URL: &str = "https://plex.tv/api/v2/user";

/// Header carrying the auth token.
const TOKEN_HEADER: &str = "X-Plex-Token";

/// Default timeout for every call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in [`PlexCleanError::Http`].
const MAX_ERROR_BODY: usize = 200;

/// Authenticated session with a Plex server.
pub struct PlexClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Auth token.
    token: String,
    /// plex.tv account endpoint.
    account_url: String,
    /// Identity fetched at connect time.
    identity: ServerIdentity,
}

impl fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexClient")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Every Plex response is wrapped in a `MediaContainer`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    /// Payload.
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

/// Server root payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootInfo {
    /// Friendly name.
    #[serde(default)]
    friendly_name: String,
    /// Version.
    #[serde(default)]
    version: String,
    /// Platform.
    #[serde(default)]
    platform: String,
    /// Platform version.
    #[serde(default)]
    platform_version: String,
}

/// `/library/sections` payload.
#[derive(Debug, Deserialize)]
struct SectionList {
    /// Sections; absent when there are none.
    #[serde(rename = "Directory", default)]
    directories: Vec<Directory>,
}

/// One library section.
#[derive(Debug, Deserialize)]
struct Directory {
    /// Section key.
    key: String,
    /// Section title.
    #[serde(default)]
    title: String,
    /// Section type.
    #[serde(rename = "type", default)]
    kind: String,
}

/// Collection listing or metadata payload.
#[derive(Debug, Deserialize)]
struct MetadataList {
    /// Entries; absent when there are none.
    #[serde(rename = "Metadata", default)]
    metadata: Vec<Metadata>,
}

/// Collection metadata.
#[derive(Debug, Deserialize)]
struct Metadata {
    /// Rating key.
    #[serde(rename = "ratingKey")]
    rating_key: String,
    /// Title.
    #[serde(default)]
    title: String,
    /// Labels, only present when the server included them.
    #[serde(rename = "Label")]
    labels: Option<Vec<Tag>>,
}

/// Tag object (`{"tag": "..."}`).
#[derive(Debug, Deserialize)]
struct Tag {
    /// Tag text.
    tag: String,
}

/// Collection children payload; only the count matters.
#[derive(Debug, Deserialize)]
struct ChildList {
    /// Child items.
    #[serde(rename = "Metadata", default)]
    items: Vec<IgnoredAny>,
}

/// plex.tv account payload.
#[derive(Debug, Deserialize)]
struct Account {
    /// Account username.
    #[serde(default)]
    username: String,
}

impl PlexClient {
    /// Connect to a Plex server and fetch its identity.
    ///
    /// # Errors
    ///
    /// Fails if the URL is malformed, the token is rejected, or the server
    /// cannot be reached.
    pub fn connect(server_url: &str, token: &str) -> Result<Self> {
        Self::connect_with_timeout(server_url, token, REQUEST_TIMEOUT)
    }

    /// Like [`PlexClient::connect`], with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Same as [`PlexClient::connect`].
    pub fn connect_with_timeout(server_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base_url = validate_url(server_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("plexclean/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut session = Self {
            client,
            base_url,
            token: token.to_string(),
            account_url: PLEX_TV_USER_URL.to_string(),
            identity: ServerIdentity::default(),
        };

        let root: RootInfo = session.get("/")?;
        session.identity = ServerIdentity {
            name: root.friendly_name,
            version: root.version,
            platform: root.platform,
            platform_version: root.platform_version,
        };

        Ok(session)
    }

    /// Use a different account endpoint than plex.tv.
    #[must_use]
    pub fn with_account_url(mut self, url: impl Into<String>) -> Self {
        self.account_url = url.into();
        self
    }

    /// Look up the username the token belongs to.
    ///
    /// # Errors
    ///
    /// Fails if plex.tv rejects the token or cannot be reached.
    pub fn account_username(&self) -> Result<String> {
        let url = &self.account_url;
        let response = self.send(Method::GET, url, url)?;
        let account: Account = decode(url, response)?;
        Ok(account.username)
    }

    /// GET a path and unwrap its `MediaContainer`.
    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self.send(Method::GET, path, &url)?;
        let envelope: Envelope<T> = decode(path, response)?;
        Ok(envelope.media_container)
    }

    /// Send a request and map transport and status failures.
    fn send(&self, method: Method, path: &str, url: &str) -> Result<Response> {
        tracing::debug!(%method, path, "plex request");

        let response = self
            .client
            .request(method, url)
            .header(TOKEN_HEADER, &self.token)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    PlexCleanError::Timeout {
                        path: path.to_string(),
                    }
                } else if e.is_connect() {
                    PlexCleanError::Unreachable {
                        url: url.to_string(),
                        source: e,
                    }
                } else {
                    PlexCleanError::Transport(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let path = path.to_string();
        Err(match status {
            StatusCode::UNAUTHORIZED => PlexCleanError::Unauthorized { path },
            StatusCode::NOT_FOUND => PlexCleanError::NotFound { path },
            _ => {
                let body: String = response
                    .text()
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect();
                PlexCleanError::Http {
                    path,
                    status: status.as_u16(),
                    body,
                }
            }
        })
    }

    /// Labels for one collection, fetched from its metadata.
    fn fetch_labels(&self, rating_key: &str) -> Result<Vec<String>> {
        let list: MetadataList = self.get(&format!("/library/metadata/{rating_key}"))?;
        Ok(list
            .metadata
            .into_iter()
            .next()
            .and_then(|m| m.labels)
            .map(tags)
            .unwrap_or_default())
    }
}

impl MediaServer for PlexClient {
    fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    fn libraries(&self) -> Result<Vec<LibrarySection>> {
        let list: SectionList = self.get("/library/sections")?;
        Ok(list
            .directories
            .into_iter()
            .map(|d| LibrarySection {
                key: d.key,
                title: d.title,
                kind: d.kind,
            })
            .collect())
    }

    fn collections(&self, library: &LibrarySection) -> Result<Vec<ListedCollection>> {
        let list: MetadataList = self.get(&format!("/library/sections/{}/collections", library.key))?;

        Ok(list
            .metadata
            .into_iter()
            .map(|m| {
                let labels = match m.labels {
                    Some(labels) => tags(labels),
                    None => match self.fetch_labels(&m.rating_key) {
                        Ok(labels) => labels,
                        Err(error) => {
                            return ListedCollection::Unreadable {
                                title: m.title,
                                error,
                            };
                        }
                    },
                };
                ListedCollection::Ready(CollectionEntry {
                    rating_key: m.rating_key,
                    title: m.title,
                    labels,
                })
            })
            .collect())
    }

    fn item_count(&self, collection: &CollectionEntry) -> Result<usize> {
        let children: ChildList =
            self.get(&format!("/library/collections/{}/children", collection.rating_key))?;
        Ok(children.items.len())
    }

    fn delete_collection(&self, collection: &CollectionEntry) -> Result<()> {
        let path = format!("/library/collections/{}", collection.rating_key);
        let url = format!("{}{path}", self.base_url);
        self.send(Method::DELETE, &path, &url)?;
        Ok(())
    }
}

/// Flatten tag objects into their text.
fn tags(tags: Vec<Tag>) -> Vec<String> {
    tags.into_iter().map(|t| t.tag).collect()
}

/// Read a response body and decode it as JSON.
fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|source| PlexCleanError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Check that `raw` is an absolute http(s) URL and strip trailing slashes.
fn validate_url(raw: &str) -> Result<String> {
    let invalid = |reason: String| PlexCleanError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

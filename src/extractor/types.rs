use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Description used whenever no upstream produced one.
pub const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Twitter,
    Youtube,
    Reddit,
    Web,
}

impl Source {
    /// Classify a URL by hostname. First match wins.
    pub fn classify(url: &Url) -> Self {
        let Some(host) = url.host_str() else {
            return Self::Web;
        };
        let host = host.to_ascii_lowercase();

        if host_matches(&host, &["twitter.com", "x.com"]) {
            Self::Twitter
        } else if host_matches(&host, &["youtube.com", "youtu.be"]) {
            Self::Youtube
        } else if host_matches(&host, &["reddit.com"]) {
            Self::Reddit
        } else {
            Self::Web
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Youtube => "youtube",
            Self::Reddit => "reddit",
            Self::Web => "web",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `host` equals one of `domains` or is a subdomain of it.
fn host_matches(host: &str, domains: &[&str]) -> bool {
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(*domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Normalized preview of a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub source: Source,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Metadata {
    /// Degraded record returned when every upstream attempt failed.
    pub fn fallback(url: &str, source: Source) -> Self {
        Self {
            title: url.to_string(),
            description: NO_DESCRIPTION.to_string(),
            thumbnail: String::new(),
            images: Vec::new(),
            source,
            tags: Vec::new(),
        }
    }

    /// Whether this record carries the fallback description.
    pub fn is_degraded(&self) -> bool {
        self.description == NO_DESCRIPTION
    }
}

/// Per-call options for [`Resolver::resolve`](super::Resolver::resolve).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOptions {
    pub youtube_api_key: Option<String>,
}

impl ResolveOptions {
    pub fn with_youtube_api_key(key: impl Into<String>) -> Self {
        Self {
            youtube_api_key: Some(key.into()),
        }
    }

    /// The API key, ignoring blank values.
    pub(crate) fn youtube_key(&self) -> Option<&str> {
        self.youtube_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Failure of a single upstream attempt, or of building the HTTP client.
/// [`Resolver::resolve`](super::Resolver::resolve) never returns it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("unexpected content type: {0}")]
    ContentType(String),

    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("upstream response is missing {0}")]
    Missing(&'static str),
}

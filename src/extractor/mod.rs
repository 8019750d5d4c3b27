mod twitter;
mod types;
mod web;
mod youtube;

pub use types::*;

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Proxy};
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URLs of the third-party APIs the resolver talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Tweet unfurler, queried as `{twitter_api}/status/{id}`.
    pub twitter_api: String,
    /// oEmbed unfurler, queried as `{oembed_api}?url={url}`.
    pub oembed_api: String,
    /// YouTube Data API v3 root, queried as `{youtube_api}/videos`.
    pub youtube_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            twitter_api: "https://api.fxtwitter.com".to_string(),
            oembed_api: "https://noembed.com/embed".to_string(),
            youtube_api: "https://www.googleapis.com/youtube/v3".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
    /// Route every upstream request through this proxy.
    pub proxy: Option<String>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` when no explicit proxy is set.
    pub system_proxy: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
            proxy: None,
            system_proxy: true,
        }
    }
}

/// Turns pasted URLs into [`Metadata`] records.
///
/// Stateless between calls: the only thing shared is the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: Client,
    endpoints: Endpoints,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ExtractError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout);

        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.is_empty()) {
            builder = builder.proxy(Proxy::all(proxy)?);
        } else if !config.system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            endpoints: config.endpoints,
        })
    }

    /// Resolve `url` into a fully populated record. Never fails: every upstream
    /// error degrades to the next tier, and finally to [`Metadata::fallback`].
    pub async fn resolve(&self, url: &str, options: &ResolveOptions) -> Metadata {
        let input = url.trim();

        let Some(parsed) = parse_input(input) else {
            tracing::debug!("Unparseable URL {:?}, returning fallback", input);
            return Metadata::fallback(input, Source::Web);
        };

        let source = Source::classify(&parsed);
        tracing::info!("Fetching metadata for: {} ({})", input, source);

        let resolved = match source {
            Source::Twitter => self.resolve_twitter(&parsed).await,
            Source::Youtube => self.resolve_youtube(&parsed, options).await,
            // No dedicated reddit handler; reddit pages go through the generic scraper.
            Source::Reddit | Source::Web => None,
        };

        if let Some(metadata) = resolved {
            return metadata;
        }

        match self.fetch_page(&parsed, input, source).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Metadata fetch failed for {}: {}", input, e);
                Metadata::fallback(input, source)
            }
        }
    }

    async fn resolve_twitter(&self, url: &Url) -> Option<Metadata> {
        let id = twitter::tweet_id(url)?;
        attempt("tweet api", self.fetch_tweet(&id)).await
    }

    async fn resolve_youtube(&self, url: &Url, options: &ResolveOptions) -> Option<Metadata> {
        let video_id = youtube::video_id(url);

        if let (Some(key), Some(id)) = (options.youtube_key(), video_id.as_deref()) {
            if let Some(metadata) = attempt("youtube data api", self.fetch_video(id, key)).await {
                return Some(metadata);
            }
        }

        attempt("oembed", self.fetch_oembed(url, video_id.as_deref())).await
    }
}

/// Run one tier of the fallback chain, logging and discarding its error.
async fn attempt<F>(tier: &str, fut: F) -> Option<Metadata>
where
    F: Future<Output = Result<Metadata, ExtractError>>,
{
    match fut.await {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::debug!("{} failed, falling through: {}", tier, e);
            None
        }
    }
}

/// Parse user input, accepting scheme-less forms like `www.example.com/page`.
fn parse_input(input: &str) -> Option<Url> {
    if input.is_empty() {
        return None;
    }

    match Url::parse(input) {
        Ok(url) if is_http(&url) => Some(url),
        // `example.com:8080/page` parses with `example.com` as its scheme.
        Ok(_) if !input.contains("://") => with_https(input),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => with_https(input),
        Err(_) => None,
    }
}

fn with_https(input: &str) -> Option<Url> {
    // `mailto:me@example.com` would otherwise reparse as userinfo + host.
    Url::parse(&format!("https://{}", input)).ok().filter(|url| {
        url.username().is_empty()
            && url
                .host_str()
                .is_some_and(|h| h.contains('.') || h == "localhost")
    })
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Resolve metadata for a URL using the public endpoints and default settings.
pub async fn resolve_metadata(url: &str, options: &ResolveOptions) -> Metadata {
    match Resolver::new(ResolverConfig::default()) {
        Ok(resolver) => resolver.resolve(url, options).await,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            let input = url.trim();
            let source = parse_input(input)
                .map(|u| Source::classify(&u))
                .unwrap_or(Source::Web);
            Metadata::fallback(input, source)
        }
    }
}

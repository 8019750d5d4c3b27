use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::{ExtractError, Metadata, Resolver, Source, NO_DESCRIPTION};

static STATUS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[^/]+/status/(\d+)").expect("static regex must compile"));

/// Numeric status id from `/<user>/status/<digits>`.
pub(super) fn tweet_id(url: &Url) -> Option<String> {
    STATUS_PATH
        .captures(url.path())
        .map(|caps| caps[1].to_string())
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    code: u16,
    tweet: Option<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    #[serde(default)]
    text: String,
    author: Author,
    #[serde(default)]
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Media {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    url: String,
}

impl From<Tweet> for Metadata {
    fn from(tweet: Tweet) -> Self {
        let images: Vec<String> = tweet
            .media
            .unwrap_or_default()
            .photos
            .into_iter()
            .map(|p| p.url)
            .filter(|u| !u.is_empty())
            .collect();

        let thumbnail = images
            .first()
            .cloned()
            .or(tweet.author.avatar_url)
            .unwrap_or_default();

        let description = if tweet.text.trim().is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            tweet.text
        };

        Metadata {
            title: format!("{} on X", tweet.author.name),
            description,
            thumbnail,
            images,
            source: Source::Twitter,
            tags: Vec::new(),
        }
    }
}

impl Resolver {
    pub(super) async fn fetch_tweet(&self, id: &str) -> Result<Metadata, ExtractError> {
        let api_url = format!(
            "{}/status/{}",
            self.endpoints.twitter_api.trim_end_matches('/'),
            id
        );

        let response = self.client.get(&api_url).send().await?;
        if !response.status().is_success() {
            return Err(ExtractError::Status(response.status().as_u16()));
        }

        let body: TweetResponse = response.json().await?;
        if body.code != 200 {
            return Err(ExtractError::Status(body.code));
        }

        body.tweet
            .map(Metadata::from)
            .ok_or(ExtractError::Missing("tweet"))
    }
}

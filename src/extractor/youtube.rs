use serde::Deserialize;
use url::Url;

use super::{ExtractError, Metadata, Resolver, Source, NO_DESCRIPTION};

/// Canonical max-resolution still for a video id.
pub(super) fn maxres_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

/// Video id from `?v=<id>`, `youtu.be/<id>`, `/shorts/<id>` or `/embed/<id>`.
pub(super) fn video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();

    let id = if host == "youtu.be" || host.ends_with(".youtu.be") {
        url.path_segments()?.next().map(str::to_string)
    } else if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        Some(v.into_owned())
    } else {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("shorts") | Some("embed") | Some("live") => segments.next().map(str::to_string),
            _ => None,
        }
    };

    id.filter(|id| !id.is_empty())
}

// ============ OFFICIAL DATA API ============

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    /// Highest resolution available, preferring maxres, then high, then default.
    fn best(&self) -> Option<&str> {
        [&self.maxres, &self.high, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.as_str())
            .find(|u| !u.is_empty())
    }
}

impl From<Snippet> for Metadata {
    fn from(snippet: Snippet) -> Self {
        let thumbnail = snippet.thumbnails.best().unwrap_or_default().to_string();
        let images = if thumbnail.is_empty() {
            Vec::new()
        } else {
            vec![thumbnail.clone()]
        };

        Metadata {
            title: snippet.title,
            description: non_empty_or_sentinel(snippet.description),
            thumbnail,
            images,
            source: Source::Youtube,
            tags: snippet.tags,
        }
    }
}

// ============ OEMBED ============

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

fn non_empty_or_sentinel(s: String) -> String {
    if s.trim().is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        s
    }
}

impl Resolver {
    pub(super) async fn fetch_video(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> Result<Metadata, ExtractError> {
        let api_url = format!(
            "{}/videos",
            self.endpoints.youtube_api.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&api_url)
            .query(&[("part", "snippet"), ("id", video_id), ("key", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status(response.status().as_u16()));
        }

        let body: VideoListResponse = response.json().await?;
        let video = body
            .items
            .into_iter()
            .next()
            .ok_or(ExtractError::Missing("video item"))?;

        if video.snippet.title.trim().is_empty() {
            return Err(ExtractError::Missing("snippet title"));
        }

        Ok(video.snippet.into())
    }

    pub(super) async fn fetch_oembed(
        &self,
        url: &Url,
        video_id: Option<&str>,
    ) -> Result<Metadata, ExtractError> {
        let api_url = format!(
            "{}?url={}",
            self.endpoints.oembed_api,
            urlencoding::encode(url.as_str())
        );

        let response = self.client.get(&api_url).send().await?;
        if !response.status().is_success() {
            return Err(ExtractError::Status(response.status().as_u16()));
        }

        let body: OEmbed = response.json().await?;
        let title = body
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(ExtractError::Missing("title"))?;

        let thumbnail = match video_id {
            Some(id) => maxres_thumbnail(id),
            None => body.thumbnail_url.unwrap_or_default(),
        };
        let images = if thumbnail.is_empty() {
            Vec::new()
        } else {
            vec![thumbnail.clone()]
        };

        Ok(Metadata {
            title,
            description: non_empty_or_sentinel(body.author_name.unwrap_or_default()),
            thumbnail,
            images,
            source: Source::Youtube,
            tags: Vec::new(),
        })
    }
}

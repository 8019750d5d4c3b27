//! Generic page scraping: Open Graph, Twitter Card and plain `<meta>` tags.

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use url::Url;

use super::{ExtractError, Metadata, Resolver, Source, NO_DESCRIPTION};

/// Pages larger than this are not worth parsing for a preview.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Raw values pulled out of a document before any fallback is applied.
#[derive(Debug, Default, PartialEq)]
pub(super) struct PageMeta {
    pub og_title: Option<String>,
    pub title: Option<String>,
    pub og_description: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub twitter_image: Option<String>,
    pub tags: Vec<String>,
}

impl PageMeta {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut meta = PageMeta::default();
        let mut keywords = Vec::new();
        let mut article_tags = Vec::new();

        if let Ok(sel) = Selector::parse("title") {
            if let Some(el) = document.select(&sel).next() {
                meta.title = non_blank(&el.text().collect::<String>());
            }
        }

        if let Ok(sel) = Selector::parse("meta") {
            for el in document.select(&sel) {
                let attrs = el.value();
                let Some(content) = attrs.attr("content") else {
                    continue;
                };
                let Some(content) = non_blank(content) else {
                    continue;
                };
                // Sites mix up `property` and `name` for OG and Twitter Card tags.
                let key = attrs
                    .attr("property")
                    .or_else(|| attrs.attr("name"))
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase();

                match key.as_str() {
                    "og:title" => set_once(&mut meta.og_title, content),
                    "og:description" => set_once(&mut meta.og_description, content),
                    "description" => set_once(&mut meta.description, content),
                    "og:image" | "og:image:url" => set_once(&mut meta.og_image, content),
                    "twitter:image" | "twitter:image:src" => {
                        set_once(&mut meta.twitter_image, content)
                    }
                    "keywords" => keywords.extend(content.split(',').filter_map(non_blank)),
                    "article:tag" => article_tags.push(content),
                    _ => {}
                }
            }
        }

        meta.tags = dedup_preserving_order(keywords.into_iter().chain(article_tags));
        meta
    }

    /// Apply the fallback order and resolve the image against `page_url`.
    pub fn into_metadata(self, page_url: &Url, raw_url: &str, source: Source) -> Metadata {
        let thumbnail = self
            .og_image
            .or(self.twitter_image)
            .and_then(|image| absolutize(page_url, &image))
            .unwrap_or_default();
        let images = if thumbnail.is_empty() {
            Vec::new()
        } else {
            vec![thumbnail.clone()]
        };

        Metadata {
            title: self
                .og_title
                .or(self.title)
                .unwrap_or_else(|| raw_url.to_string()),
            description: self
                .og_description
                .or(self.description)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            thumbnail,
            images,
            source,
            tags: self.tags,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn dedup_preserving_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Resolve `reference` against `base`. Malformed references yield `None`.
pub(super) fn absolutize(base: &Url, reference: &str) -> Option<String> {
    match Url::parse(reference) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(reference).ok().map(|u| u.to_string())
        }
        Err(e) => {
            tracing::debug!("Ignoring malformed image URL {:?}: {}", reference, e);
            None
        }
    }
}

impl Resolver {
    pub(super) async fn fetch_page(
        &self,
        url: &Url,
        raw_url: &str,
        source: Source,
    ) -> Result<Metadata, ExtractError> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status(response.status().as_u16()));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.to_ascii_lowercase().contains("html") {
                return Err(ExtractError::ContentType(content_type.to_string()));
            }
        }

        let page_url = response.url().clone();

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(ExtractError::BodyTooLarge(MAX_BODY_BYTES));
            }
            body.extend_from_slice(&chunk);
        }

        let html = String::from_utf8_lossy(&body);
        Ok(PageMeta::parse(&html).into_metadata(&page_url, raw_url, source))
    }
}

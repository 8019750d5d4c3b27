//! Flat-file card collection.
//!
//! The whole collection lives in memory and is rewritten to a single JSON file
//! after every mutation. Ids auto-increment from the highest id on disk.

mod error;

pub use error::StoreError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::extractor::Metadata;

/// A saved [`Metadata`] record plus registry bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCard {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(default)]
    pub note: Option<String>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub note: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Az,
    Za,
}

impl SortOrder {
    fn sort(self, cards: &mut [Card]) {
        match self {
            // Ties on date fall back to id so insertion order stays stable.
            Self::Newest => cards.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id))),
            Self::Oldest => cards.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id))),
            Self::Az => cards.sort_by_cached_key(|c| c.metadata.title.to_lowercase()),
            Self::Za => {
                cards.sort_by_cached_key(|c| c.metadata.title.to_lowercase());
                cards.reverse();
            }
        }
    }
}

#[derive(Clone)]
pub struct CardStore {
    path: PathBuf,
    cards: Arc<RwLock<Vec<Card>>>,
}

impl CardStore {
    /// Open the collection at `path`. A missing file is an empty collection.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let cards = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };

        tracing::info!("Loaded {} cards from {}", cards.len(), path.display());

        Ok(Self {
            path,
            cards: Arc::new(RwLock::new(cards)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self, order: SortOrder) -> Vec<Card> {
        let mut cards = self.cards.read().await.clone();
        order.sort(&mut cards);
        cards
    }

    pub async fn get(&self, id: u64) -> Option<Card> {
        self.cards.read().await.iter().find(|c| c.id == id).cloned()
    }

    pub async fn create(&self, new: NewCard) -> Result<Card, StoreError> {
        let mut cards = self.cards.write().await;

        let id = cards.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let card = Card {
            id,
            date: Utc::now(),
            note: new.note.filter(|n| !n.trim().is_empty()),
            metadata: new.metadata,
        };

        let mut next = cards.clone();
        next.push(card.clone());
        self.persist(&next).await?;
        *cards = next;

        tracing::debug!("Created card {} ({})", card.id, card.metadata.title);
        Ok(card)
    }

    pub async fn update(&self, id: u64, patch: CardPatch) -> Result<Card, StoreError> {
        let mut cards = self.cards.write().await;

        let index = cards
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut card = cards[index].clone();
        if let Some(title) = patch.title.filter(|t| !t.trim().is_empty()) {
            card.metadata.title = title;
        }
        if let Some(description) = patch.description {
            card.metadata.description = description;
        }
        if let Some(thumbnail) = patch.thumbnail {
            card.metadata.thumbnail = thumbnail;
        }
        if let Some(note) = patch.note {
            card.note = (!note.trim().is_empty()).then_some(note);
        }
        if let Some(tags) = patch.tags {
            card.metadata.tags = tags;
        }

        let mut next = cards.clone();
        next[index] = card.clone();
        self.persist(&next).await?;
        *cards = next;

        Ok(card)
    }

    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        match self.delete_many(&[id]).await? {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    /// Remove every card whose id is in `ids`; returns how many were removed.
    pub async fn delete_many(&self, ids: &[u64]) -> Result<usize, StoreError> {
        let mut cards = self.cards.write().await;

        let next: Vec<Card> = cards
            .iter()
            .filter(|c| !ids.contains(&c.id))
            .cloned()
            .collect();
        let removed = cards.len() - next.len();

        if removed > 0 {
            self.persist(&next).await?;
            *cards = next;
        }
        Ok(removed)
    }

    /// Write to a sibling temp file, then rename over the target. Callers swap
    /// the in-memory collection only after this succeeds.
    async fn persist(&self, cards: &[Card]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(cards)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Source;
    use chrono::TimeZone;

    fn metadata(title: &str) -> Metadata {
        Metadata {
            title: title.to_string(),
            description: "desc".to_string(),
            thumbnail: String::new(),
            images: Vec::new(),
            source: Source::Web,
            tags: vec!["web".to_string()],
        }
    }

    fn card(id: u64, title: &str, day: u32) -> Card {
        Card {
            id,
            date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            note: None,
            metadata: metadata(title),
        }
    }

    #[test]
    fn sort_orders() {
        let base = vec![card(1, "beta", 1), card(2, "Alpha", 3), card(3, "gamma", 2)];
        let ids = |order: SortOrder| {
            let mut cards = base.clone();
            order.sort(&mut cards);
            cards.iter().map(|c| c.id).collect::<Vec<_>>()
        };

        assert_eq!(ids(SortOrder::Newest), vec![2, 3, 1]);
        assert_eq!(ids(SortOrder::Oldest), vec![1, 3, 2]);
        assert_eq!(ids(SortOrder::Az), vec![2, 1, 3]);
        assert_eq!(ids(SortOrder::Za), vec![3, 1, 2]);
    }

    #[test]
    fn card_json_is_flat() {
        let json = serde_json::to_value(card(7, "t", 1)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "t");
        assert_eq!(json["source"], "web");
        assert!(json.get("note").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[tokio::test]
    async fn ids_auto_increment_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");

        let store = CardStore::open(&path).await.unwrap();
        let a = store
            .create(NewCard { metadata: metadata("a"), note: None })
            .await
            .unwrap();
        let b = store
            .create(NewCard { metadata: metadata("b"), note: Some("mine".into()) })
            .await
            .unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.delete(2).await.unwrap();
        let reopened = CardStore::open(&path).await.unwrap();
        assert_eq!(reopened.list(SortOrder::Oldest).await.len(), 1);

        let c = reopened
            .create(NewCard { metadata: metadata("c"), note: None })
            .await
            .unwrap();
        assert_eq!(c.id, 2);
    }

    #[tokio::test]
    async fn update_keeps_date_and_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = CardStore::open(dir.path().join("cards.json")).await.unwrap();
        let created = store
            .create(NewCard { metadata: metadata("old"), note: None })
            .await
            .unwrap();

        let updated = store
            .update(
                created.id,
                CardPatch {
                    title: Some("new".into()),
                    note: Some("remember".into()),
                    ..CardPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.metadata.title, "new");
        assert_eq!(updated.note.as_deref(), Some("remember"));
        assert_eq!(updated.metadata.description, "desc");
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CardStore::open(dir.path().join("cards.json")).await.unwrap();

        assert!(store.get(9).await.is_none());
        assert!(matches!(store.delete(9).await, Err(StoreError::NotFound(9))));
        assert!(matches!(
            store.update(9, CardPatch::default()).await,
            Err(StoreError::NotFound(9))
        ));
        assert_eq!(store.delete_many(&[1, 2]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            CardStore::open(&path).await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn failed_write_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("cards.json");
        let store = CardStore::open(&path).await.unwrap();
        let kept = store
            .create(NewCard { metadata: metadata("kept"), note: None })
            .await
            .unwrap();

        // Replace the parent directory with a plain file so every write fails.
        std::fs::remove_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub"), "not a directory").unwrap();

        assert!(matches!(
            store.create(NewCard { metadata: metadata("lost"), note: None }).await,
            Err(StoreError::Io { .. })
        ));
        assert!(store
            .update(
                kept.id,
                CardPatch {
                    title: Some("renamed".into()),
                    ..CardPatch::default()
                }
            )
            .await
            .is_err());
        assert!(store.delete(kept.id).await.is_err());

        let cards = store.list(SortOrder::Oldest).await;
        assert_eq!(cards, vec![kept.clone()]);
        assert!(store.get(2).await.is_none());
        assert_eq!(store.get(kept.id).await.unwrap().metadata.title, "kept");
    }
}

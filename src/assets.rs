//! Theme and locale files served to the UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid locale id: {0:?}")]
    InvalidId(String),

    #[error("locale {0:?} not found")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub colors: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locale {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ThemeFile {
    name: Option<String>,
    #[serde(default)]
    colors: Value,
}

/// `*.json` files in `dir`, sorted by file name, as `(stem, path)`.
fn json_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, AssetError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            Some((stem, path))
        })
        .collect();

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn read_json(path: &Path) -> Result<Value, AssetError> {
    let content = fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| AssetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Every theme in `dir`. Files that fail to parse are skipped.
pub fn list_themes(dir: &Path) -> Result<Vec<Theme>, AssetError> {
    let mut themes = Vec::new();

    for (id, path) in json_files(dir)? {
        let parsed = read_json(&path).and_then(|value| {
            serde_json::from_value::<ThemeFile>(value).map_err(|source| AssetError::Json {
                path: path.clone(),
                source,
            })
        });

        match parsed {
            Ok(file) => themes.push(Theme {
                name: file.name.unwrap_or_else(|| id.clone()),
                id,
                colors: file.colors,
            }),
            Err(e) => tracing::warn!("Skipping theme: {}", e),
        }
    }

    Ok(themes)
}

/// Every locale in `dir`, named by its `name` or `language.name` field.
pub fn list_locales(dir: &Path) -> Result<Vec<Locale>, AssetError> {
    let mut locales = Vec::new();

    for (id, path) in json_files(dir)? {
        let name = match read_json(&path) {
            Ok(value) => value
                .get("name")
                .or_else(|| value.get("language").and_then(|l| l.get("name")))
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(e) => {
                tracing::warn!("Skipping locale: {}", e);
                continue;
            }
        };

        locales.push(Locale {
            name: name.unwrap_or_else(|| id.clone()),
            id,
        });
    }

    Ok(locales)
}

/// Translation document for locale `id`.
pub fn load_locale(dir: &Path, id: &str) -> Result<Value, AssetError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AssetError::InvalidId(id.to_string()));
    }

    let path = dir.join(format!("{}.json", id));
    if !path.is_file() {
        return Err(AssetError::NotFound(id.to_string()));
    }

    read_json(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_themes(&missing).unwrap().is_empty());
        assert!(list_locales(&missing).unwrap().is_empty());
    }

    #[test]
    fn lists_themes_and_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("nebula.json"),
            json!({ "name": "Nebula", "colors": { "primary": "#7c3aed" } }).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let themes = list_themes(dir.path()).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].id, "nebula");
        assert_eq!(themes[0].name, "Nebula");
        assert_eq!(themes[0].colors["primary"], "#7c3aed");
    }

    #[test]
    fn locale_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.json"), json!({ "name": "English" }).to_string()).unwrap();
        fs::write(
            dir.path().join("de.json"),
            json!({ "language": { "name": "Deutsch" } }).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("fr.json"), json!({ "dashboard": {} }).to_string()).unwrap();

        let locales = list_locales(dir.path()).unwrap();
        let pairs: Vec<(&str, &str)> = locales
            .iter()
            .map(|l| (l.id.as_str(), l.name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("de", "Deutsch"), ("en", "English"), ("fr", "fr")]);
    }

    #[test]
    fn load_locale_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("en.json"),
            json!({ "dashboard": { "welcome": "Hi" } }).to_string(),
        )
        .unwrap();

        assert_eq!(
            load_locale(dir.path(), "en").unwrap()["dashboard"]["welcome"],
            "Hi"
        );
        assert!(matches!(load_locale(dir.path(), "../en"), Err(AssetError::InvalidId(_))));
        assert!(matches!(load_locale(dir.path(), "ja"), Err(AssetError::NotFound(_))));
    }
}

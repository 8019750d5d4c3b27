use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Proxy for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<Value>,
}

impl OllamaClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Installed models as reported by `/api/tags`, passed through untouched.
    /// Returns an empty list when Ollama is not running.
    pub async fn list_models(&self) -> Vec<Value> {
        match self.fetch_tags().await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!("Ollama not reachable at {}: {}", self.base_url, e);
                Vec::new()
            }
        }
    }

    async fn fetch_tags(&self) -> Result<Vec<Value>, reqwest::Error> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let body: TagsResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.models)
    }
}

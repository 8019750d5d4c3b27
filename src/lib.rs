pub mod assets;
pub mod config;
pub mod error;
pub mod extractor;
pub mod ollama;
pub mod store;
pub mod system;

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use error::{AppError, AppResult, StartupError};
use extractor::{Metadata, ResolveOptions, Resolver};
use ollama::OllamaClient;
use store::{Card, CardPatch, CardStore, NewCard, SortOrder};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Resolver,
    pub store: CardStore,
    pub ollama: OllamaClient,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, StartupError> {
        let resolver = Resolver::new(config.upstream.resolver_config())?;
        let store = CardStore::open(config.cards_path()).await?;
        let mut ollama_http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.upstream.timeout_secs.max(1)));
        if !config.upstream.system_proxy {
            ollama_http = ollama_http.no_proxy();
        }
        let ollama = OllamaClient::new(ollama_http.build()?, config.ollama_url.clone());

        Ok(Self {
            config: Arc::new(config),
            resolver,
            store,
            ollama,
        })
    }
}

// ============ METADATA ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataQuery {
    pub url: Option<String>,
    pub youtube_api_key: Option<String>,
}

async fn get_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> AppResult<Json<Metadata>> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("URL is required".to_string()))?;

    let options = ResolveOptions {
        youtube_api_key: query
            .youtube_api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| state.config.youtube_api_key.clone()),
    };

    Ok(Json(state.resolver.resolve(&url, &options).await))
}

// ============ DASHBOARD ============

async fn get_system() -> AppResult<Json<system::SystemStats>> {
    Ok(Json(system::snapshot().await?))
}

async fn get_models(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.ollama.list_models().await)
}

async fn get_themes(State(state): State<AppState>) -> AppResult<Json<Vec<assets::Theme>>> {
    let dir = state.config.themes_path();
    let themes = tokio::task::spawn_blocking(move || assets::list_themes(&dir))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(themes))
}

async fn get_locales(State(state): State<AppState>) -> AppResult<Json<Vec<assets::Locale>>> {
    let dir = state.config.locales_path();
    let locales = tokio::task::spawn_blocking(move || assets::list_locales(&dir))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(locales))
}

async fn get_locale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let dir = state.config.locales_path();
    let locale = tokio::task::spawn_blocking(move || assets::load_locale(&dir, &id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(locale))
}

// ============ CARDS ============

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<u64>,
}

async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Card>> {
    Json(state.store.list(query.sort).await)
}

async fn get_card(State(state): State<AppState>, Path(id): Path<u64>) -> AppResult<Json<Card>> {
    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("card {} not found", id)))
}

async fn create_card(
    State(state): State<AppState>,
    Json(new): Json<NewCard>,
) -> AppResult<(StatusCode, Json<Card>)> {
    if new.metadata.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    let card = state.store.create(new).await?;
    tracing::info!("Saved card {}: {}", card.id, card.metadata.title);
    Ok((StatusCode::CREATED, Json(card)))
}

async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<CardPatch>,
) -> AppResult<Json<Card>> {
    Ok(Json(state.store.update(id, patch).await?))
}

async fn delete_card(State(state): State<AppState>, Path(id): Path<u64>) -> AppResult<StatusCode> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_cards(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> AppResult<Json<Value>> {
    let deleted = state.store.delete_many(&request.ids).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============ SERVER SETUP ============

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/metadata", get(get_metadata))
        .route("/api/system", get(get_system))
        .route("/api/models", get(get_models))
        .route("/api/themes", get(get_themes))
        .route("/api/locales", get(get_locales))
        .route("/api/locales/{id}", get(get_locale))
        .route("/api/cards", get(list_cards).post(create_card))
        .route("/api/cards/delete", post(delete_cards))
        .route(
            "/api/cards/{id}",
            get(get_card).patch(update_card).delete(delete_card),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), StartupError> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config).await?;
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!("CosmicMind backend running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

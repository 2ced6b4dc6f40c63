mod api;
mod bookmarks;
mod catalog;
mod config;
mod gemini;
mod models;
mod prompt;
mod reconcile;
mod search;
mod suggestion;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use bookmarks::BookmarkStore;
use catalog::Catalog;
use config::Config;
use gemini::{GeminiClient, TextGenerator};
use suggestion::FormSubmitter;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub bookmarks: Arc<RwLock<BookmarkStore>>,
    pub generator: Arc<dyn TextGenerator>,
    pub submitter: FormSubmitter,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route("/api/tools", get(api::list_tools))
        .route("/api/tools/exists", get(api::tool_exists))
        .route("/api/tools/list.txt", get(api::download_tools_list))
        .route("/api/stats", get(api::stats))
        .route("/api/categories", get(api::categories))
        .route("/api/recommendations", post(api::recommendations))
        .route(
            "/api/recommendations/generate",
            post(api::generate_recommendations),
        )
        .route(
            "/api/bookmarks",
            get(api::list_bookmarks).delete(api::clear_bookmarks),
        )
        .route("/api/bookmarks/{id}/toggle", post(api::toggle_bookmark))
        .route("/api/suggestions", post(api::suggest_tool))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devtoolbox=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set; recommendation requests will fail");
    }

    let catalog = Catalog::load(&config.catalog_source).await;
    if catalog.is_empty() {
        warn!("Catalog is empty; every search will return no results");
    }
    let bookmarks = BookmarkStore::load(config.bookmarks_path.clone()).await;
    let generator = GeminiClient::new(
        config.gemini_api_url.clone(),
        config.gemini_api_key.clone(),
    );

    let state = AppState {
        config: config.clone(),
        catalog: Arc::new(catalog),
        bookmarks: Arc::new(RwLock::new(bookmarks)),
        generator: Arc::new(generator),
        submitter: FormSubmitter::new(config.suggestion_form_url.clone()),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("devtoolbox listening on http://{}", config.bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

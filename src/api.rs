use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    catalog::{category_keys, category_title},
    gemini::GenerationError,
    models::{
        BookmarkToggleResponse, BookmarksResponse, CategorySummary, EmptyState,
        RecommendationsResponse, SuggestionAccepted, ToolExistsQuery, ToolExistsResponse,
        ToolListQuery, ToolListResponse,
    },
    prompt::{build_prompt, ProjectBrief},
    reconcile::reconcile,
    search::{compute_visible_entries, ViewState},
    suggestion::{SuggestionError, ToolSuggestion, ACKNOWLEDGMENT},
    AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, details) = match &self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, None),
            Self::Conflict(_) => (StatusCode::CONFLICT, None),
            Self::Internal { details, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, details.as_deref())
            }
        };
        let message = self.to_string();
        let body = ErrorBody {
            error: &message,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::MissingCredential => Self::Internal {
                message: err.to_string(),
                details: None,
            },
            other => Self::Internal {
                message: "Failed to get AI recommendations".to_string(),
                details: Some(other.to_string()),
            },
        }
    }
}

impl From<SuggestionError> for ApiError {
    fn from(err: SuggestionError) -> Self {
        match err {
            SuggestionError::AlreadyListed(_) => Self::Conflict(err.to_string()),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "ok": true, "timestamp": Utc::now(), "tools": state.catalog.len() }))
}

pub async fn list_tools(
    State(state): State<AppState>,
    Query(params): Query<ToolListQuery>,
) -> impl IntoResponse {
    let mut view = ViewState::default().with_query(params.q.unwrap_or_default());
    if let Some(category) = params.category.as_deref() {
        view = view.select_category(category);
    }
    if let Some(tier) = params.price {
        view = view.toggle_price(tier);
    }
    if params.bookmarks.unwrap_or(false) {
        view = view.toggle_bookmarks_view();
    }

    let bookmarks = state.bookmarks.read().await;
    let tools = compute_visible_entries(&state.catalog, bookmarks.set(), &view)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();

    let empty_state = if !tools.is_empty() {
        None
    } else if view.showing_bookmarks {
        Some(EmptyState::Bookmarks)
    } else if view.has_active_criteria() {
        Some(EmptyState::Search)
    } else {
        None
    };

    Json(ToolListResponse {
        total: tools.len(),
        tools,
        empty_state,
    })
}

pub async fn tool_exists(
    State(state): State<AppState>,
    Query(params): Query<ToolExistsQuery>,
) -> impl IntoResponse {
    Json(ToolExistsResponse {
        exists: state.catalog.contains_name(&params.name),
        name: params.name,
    })
}

pub async fn download_tools_list(State(state): State<AppState>) -> impl IntoResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"tools-list.txt\"",
        )
        .body(Body::from(state.catalog.plain_text_list()))
        .unwrap_or_else(|_| {
            ApiError::Internal {
                message: "Failed to build download response.".to_string(),
                details: None,
            }
            .into_response()
        })
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.stats())
}

pub async fn categories(State(state): State<AppState>) -> impl IntoResponse {
    let summaries = category_keys()
        .map(|key| CategorySummary {
            key,
            title: category_title(key),
            count: state.catalog.category_count(key),
        })
        .collect::<Vec<_>>();
    Json(summaries)
}

/// Forwards a prompt to the text-generation service and returns its JSON
/// untouched.
pub async fn recommendations(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = payload
        .ok()
        .and_then(|Json(body)| {
            body.get("prompt")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_string()))?;

    let trace_id = Uuid::new_v4();
    info!(%trace_id, "Relaying recommendation prompt ({} chars)", prompt.len());

    let recommendations = state.generator.generate_json(&prompt).await.map_err(|err| {
        error!(%trace_id, "Gemini API error: {err}");
        ApiError::from(err)
    })?;

    Ok(Json(RecommendationsResponse {
        success: true,
        recommendations,
    }))
}

/// Builds the prompt from a project brief, asks the model and reconciles the
/// answer against the catalog.
pub async fn generate_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<ProjectBrief>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(brief) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    brief
        .validate()
        .map_err(|message| ApiError::BadRequest(message.to_string()))?;

    let trace_id = Uuid::new_v4();
    let prompt = build_prompt(&brief, &state.catalog);
    info!(%trace_id, "Requesting recommendations for {} project types", brief.project_types.len());

    let raw = state.generator.generate_json(&prompt).await.map_err(|err| {
        error!(%trace_id, "Error generating recommendations: {err}");
        ApiError::from(err)
    })?;

    let recommendations = reconcile(&raw, &state.catalog);
    if recommendations.is_empty() {
        info!(%trace_id, "No recommendations survived reconciliation");
    }
    info!(
        %trace_id,
        "Reconciled {} recommendations across {} categories",
        recommendations.items().count(),
        recommendations.categories.len()
    );

    Ok(Json(RecommendationsResponse {
        success: true,
        recommendations,
    }))
}

pub async fn list_bookmarks(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.bookmarks.read().await;
    let set = store.set();
    let tools = state
        .catalog
        .entries()
        .iter()
        .filter(|tool| set.contains(tool.id))
        .cloned()
        .collect();
    Json(BookmarksResponse {
        ids: set.ids().to_vec(),
        tools,
    })
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    if state.catalog.get(id).is_none() {
        return Err(ApiError::NotFound(format!("Tool {id} not found")));
    }

    let mut store = state.bookmarks.write().await;
    let bookmarked = store.toggle(id).await.map_err(persist_error)?;
    Ok(Json(BookmarkToggleResponse {
        id,
        bookmarked,
        ids: store.set().ids().to_vec(),
    }))
}

pub async fn clear_bookmarks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.bookmarks.write().await;
    store.clear().await.map_err(persist_error)?;
    Ok(Json(json!({ "ids": [] })))
}

fn persist_error(err: anyhow::Error) -> ApiError {
    error!("Failed to persist bookmarks: {err:#}");
    ApiError::Internal {
        message: "Failed to save bookmarks".to_string(),
        details: Some(format!("{err:#}")),
    }
}

/// Acknowledges after a fixed delay whether or not the collector accepted
/// the submission.
pub async fn suggest_tool(
    State(state): State<AppState>,
    payload: Result<Json<ToolSuggestion>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(suggestion) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let suggestion = suggestion.validate(&state.catalog)?;

    state.submitter.submit_detached(suggestion);
    tokio::time::sleep(state.config.suggestion_ack_delay).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(SuggestionAccepted {
            accepted: true,
            message: ACKNOWLEDGMENT.to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use super::*;
    use crate::{
        bookmarks::BookmarkStore,
        catalog::{tests::tool, Catalog},
        config::Config,
        gemini::TextGenerator,
        models::PriceTier,
        suggestion::FormSubmitter,
    };

    enum StubGenerator {
        Reply(Value),
        NoKey,
        Fails(&'static str),
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate_json(&self, _prompt: &str) -> Result<Value, GenerationError> {
            match self {
                Self::Reply(value) => Ok(value.clone()),
                Self::NoKey => Err(GenerationError::MissingCredential),
                Self::Fails(message) => Err(GenerationError::Upstream(message.to_string())),
            }
        }
    }

    async fn state_with(generator: StubGenerator, dir: &tempfile::TempDir) -> AppState {
        let mut react = tool(1, "React", "frontend", PriceTier::OpenSource);
        react.badges = vec!["Popular".to_string()];
        let catalog = Catalog::from_entries(vec![
            react,
            tool(2, "Vite", "frontend", PriceTier::Free),
            tool(3, "PostgreSQL", "database", PriceTier::OpenSource),
            tool(4, "Sentry", "monitoring", PriceTier::Freemium),
        ]);
        let bookmarks_path = dir.path().join("bookmarks.json");
        let config = Config {
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            gemini_api_key: None,
            gemini_api_url: "http://127.0.0.1:9".to_string(),
            catalog_source: "tools.json".to_string(),
            bookmarks_path: bookmarks_path.clone(),
            suggestion_form_url: "http://127.0.0.1:9/form".to_string(),
            suggestion_ack_delay: Duration::ZERO,
        };
        AppState {
            submitter: FormSubmitter::new(config.suggestion_form_url.clone()),
            config,
            catalog: Arc::new(catalog),
            bookmarks: Arc::new(RwLock::new(BookmarkStore::load(bookmarks_path).await)),
            generator: Arc::new(generator),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn list_query(q: Option<&str>, category: Option<&str>, bookmarks: bool) -> ToolListQuery {
        ToolListQuery {
            q: q.map(ToString::to_string),
            category: category.map(ToString::to_string),
            price: None,
            bookmarks: Some(bookmarks),
        }
    }

    #[tokio::test]
    async fn relay_requires_prompt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::Reply(json!({})), &dir).await;

        let response = recommendations(State(state.clone()), Ok(Json(json!({ "prompt": "" }))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Prompt is required" }));

        let response = recommendations(State(state), Ok(Json(json!({}))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn relay_reports_missing_credential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::NoKey, &dir).await;
        let response = recommendations(State(state), Ok(Json(json!({ "prompt": "hi" }))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Gemini API key not configured" })
        );
    }

    #[tokio::test]
    async fn relay_reports_upstream_failure_with_details() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::Fails("quota exceeded"), &dir).await;
        let response = recommendations(State(state), Ok(Json(json!({ "prompt": "hi" }))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Failed to get AI recommendations", "details": "quota exceeded" })
        );
    }

    #[tokio::test]
    async fn relay_returns_raw_model_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = json!({ "frontend": [{ "name": "React (v18)" }] });
        let state = state_with(StubGenerator::Reply(raw.clone()), &dir).await;
        let response = recommendations(State(state), Ok(Json(json!({ "prompt": "hi" }))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "recommendations": raw })
        );
    }

    #[tokio::test]
    async fn generate_reconciles_model_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = json!({
            "frontend": [{ "name": "React (v18)" }, { "name": "Vite", "reason": "Fast dev server" }],
            "deployment": [{ "name": "vite" }],
            "database": [{ "name": "SomeNewTool", "url": "https://x.com" }]
        });
        let state = state_with(StubGenerator::Reply(raw), &dir).await;
        let brief = ProjectBrief {
            description: "A dashboard".to_string(),
            experience_level: "beginner".to_string(),
            project_types: vec!["web".to_string()],
        };
        let response = generate_recommendations(State(state), Ok(Json(brief)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": true,
                "recommendations": {
                    "frontend": [
                        { "name": "React", "reason": "Recommended for your project needs", "inDirectory": true },
                        { "name": "Vite", "reason": "Fast dev server", "inDirectory": true }
                    ],
                    "database": [
                        { "name": "SomeNewTool", "reason": "Recommended for your project needs", "inDirectory": false, "url": "https://x.com" }
                    ]
                }
            })
        );
    }

    #[tokio::test]
    async fn generate_validates_brief() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::Reply(json!({})), &dir).await;
        let brief = ProjectBrief {
            description: "A dashboard".to_string(),
            ..ProjectBrief::default()
        };
        let response = generate_recommendations(State(state), Ok(Json(brief)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Please select your experience level." })
        );
    }

    #[tokio::test]
    async fn list_tools_ranks_and_filters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::NoKey, &dir).await;

        let response = list_tools(State(state.clone()), Query(list_query(Some("popular"), None, false)))
            .await
            .into_response();
        let body = body_json(response).await;
        assert_eq!(body["total"], json!(1));
        assert_eq!(body["tools"][0]["name"], json!("React"));

        let response = list_tools(
            State(state.clone()),
            Query(list_query(Some("react"), Some("database"), false)),
        )
        .await
        .into_response();
        let body = body_json(response).await;
        assert_eq!(body["total"], json!(0));
        assert_eq!(body["emptyState"], json!("search"));

        let response = list_tools(State(state), Query(list_query(None, None, true)))
            .await
            .into_response();
        let body = body_json(response).await;
        assert_eq!(body["emptyState"], json!("bookmarks"));
    }

    #[tokio::test]
    async fn bookmark_toggle_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::NoKey, &dir).await;

        let response = toggle_bookmark(State(state.clone()), Path(3)).await.into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "id": 3, "bookmarked": true, "ids": [3] })
        );

        let response = list_tools(State(state.clone()), Query(list_query(None, None, true)))
            .await
            .into_response();
        let body = body_json(response).await;
        assert_eq!(body["tools"][0]["name"], json!("PostgreSQL"));

        let response = toggle_bookmark(State(state.clone()), Path(3)).await.into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "id": 3, "bookmarked": false, "ids": [] })
        );

        let response = toggle_bookmark(State(state), Path(99)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clear_bookmarks_empties_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::NoKey, &dir).await;
        let response = toggle_bookmark(State(state.clone()), Path(1)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let response = toggle_bookmark(State(state.clone()), Path(2)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = clear_bookmarks(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = list_bookmarks(State(state)).await.into_response();
        assert_eq!(body_json(response).await, json!({ "ids": [], "tools": [] }));
    }

    #[tokio::test]
    async fn suggestion_is_acknowledged_after_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::NoKey, &dir).await;

        let suggestion = ToolSuggestion {
            name: "Rspack".to_string(),
            description: "Rust bundler".to_string(),
            category: "frontend".to_string(),
            url: "https://rspack.dev".to_string(),
        };
        let response = suggest_tool(State(state.clone()), Ok(Json(suggestion.clone())))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["message"], json!(ACKNOWLEDGMENT));

        let duplicate = ToolSuggestion {
            name: "sentry".to_string(),
            ..suggestion
        };
        let response = suggest_tool(State(state), Ok(Json(duplicate)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn stats_and_exists_reflect_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(StubGenerator::NoKey, &dir).await;

        let response = stats(State(state.clone())).await.into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "totalTools": 4, "freeTools": 3, "categories": 3 })
        );

        let response = tool_exists(
            State(state),
            Query(ToolExistsQuery {
                name: " vite ".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(body_json(response).await["exists"], json!(true));
    }
}

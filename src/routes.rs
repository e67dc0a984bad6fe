use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartError, rejection::PathRejection, DefaultBodyLimit, Multipart, Path,
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::auth::Authorizer;
use crate::config::FeedConfig;
use crate::db::{Article, Database, NewArticle};
use crate::error::ApiError;
use crate::fetcher::Fetcher;
use crate::news::NewsItem;
use crate::upload::{ImageStore, FIELD_NAME, PUBLIC_PREFIX};

/// Headroom above the image limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub struct AppState {
    pub db: Arc<Database>,
    pub fetcher: Fetcher,
    pub images: ImageStore,
    pub authorizer: Arc<dyn Authorizer>,
    pub feeds: Vec<FeedConfig>,
}

impl AppState {
    fn authorize(&self, supplied: Option<&str>) -> Result<(), ApiError> {
        if self.authorizer.authorize(supplied) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.images.max_bytes() + MULTIPART_OVERHEAD;
    let uploads = ServeDir::new(state.images.dir());

    Router::new()
        .route("/api/articles", get(list_articles).post(create_article))
        .route("/api/articles/:id", get(get_article).delete(delete_article))
        .route(
            "/api/upload",
            post(upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/news", get(news))
        .route("/health", get(health))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fields of any non-string JSON type, `null` included, read as empty so
/// they fail field validation rather than body parsing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateArticleRequest {
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(deserialize_with = "lenient_text")]
    pub content: String,
    #[serde(deserialize_with = "lenient_text")]
    pub author: String,
    #[serde(deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(deserialize_with = "lenient_optional")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SecretBody {
    #[serde(default, deserialize_with = "lenient_optional")]
    pub password: Option<String>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_optional(deserializer)?.unwrap_or_default())
}

fn lenient_optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

// Route handlers
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state.db.list_articles().await?;
    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Article>, ApiError> {
    let Path(id) = id?;
    state
        .db
        .get_article(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// A missing or unreadable body is treated as a missing password.
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateArticleRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    state.authorize(request.password.as_deref())?;

    let article = state
        .db
        .create_article(&NewArticle {
            title: request.title,
            content: request.content,
            author: request.author,
            category: request.category,
        })
        .await?;

    info!(id = article.id, title = %article.title, "created article");
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    body: Option<Json<SecretBody>>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let secret = body.and_then(|Json(b)| b.password);
    state.authorize(secret.as_deref())?;

    let removed = state.db.delete_article(id).await?;
    info!(id, removed, "deleted article");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let limit = state.images.max_bytes();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);

        // Reject before buffering anything.
        state.images.validate(&file_name, content_type.as_deref())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            bytes.extend_from_slice(&chunk);
            state.images.check_size(bytes.len())?;
        }

        let url = state
            .images
            .store(&file_name, content_type.as_deref(), &bytes)
            .await?;
        info!(%url, size = bytes.len(), "stored upload");
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::Validation("No image uploaded".to_string()))
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::Validation(err.body_text())
    }
}

pub async fn news(State(state): State<Arc<AppState>>) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let items = state.fetcher.aggregate(&state.feeds).await?;
    Ok(Json(items))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

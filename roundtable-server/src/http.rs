//! REST + SSE surface for Roundtable.
//!
//! Routes are JSON with camelCase field names. Chat rounds stream back as
//! `text/event-stream`, one `data:` frame per round event; the stream
//! closing signals round completion.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use roundtable_core::{
    extract_pdf, extract_text_file, ContextSource, ConversationStore, Database, EngineKind,
    NewContextSource, NewMember, NotionExtractor, RoundtableError, RoundtableResult, SourceKind,
    TurnOrchestrator, UrlExtractor,
};

const MESSAGE_PAGE_LIMIT: i64 = 100;
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
/// Above the file cap so oversized uploads reach our own size check
/// instead of dying as a 413 inside the extractor.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub store: Arc<dyn ConversationStore>,
    pub orchestrator: Arc<TurnOrchestrator>,
    pub url_extractor: Arc<UrlExtractor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/{id}", get(get_room).delete(delete_room))
        .route(
            "/api/rooms/{id}/members",
            get(list_members).post(create_member),
        )
        .route("/api/rooms/{id}/members/reorder", post(reorder_members))
        .route(
            "/api/rooms/{id}/members/{member_id}",
            delete(delete_member),
        )
        .route(
            "/api/rooms/{id}/members/{member_id}/context-sources",
            get(list_context_sources).post(create_context_source),
        )
        .route(
            "/api/rooms/{id}/members/{member_id}/context-sources/{source_id}",
            delete(delete_context_source),
        )
        .route("/api/rooms/{id}/messages", get(list_messages))
        .route("/api/rooms/{id}/chat", post(chat))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

/// Wraps [`RoundtableError`] so handlers can use `?` and still produce the
/// right status: 400 for caller mistakes, 404 for missing resources, 500
/// for everything else. The body is always `{"error": "..."}`.
pub struct ApiError(RoundtableError);

impl From<RoundtableError> for ApiError {
    fn from(err: RoundtableError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            self.0.log();
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// ============================================================================
// Health
// ============================================================================

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .db
        .health_check()
        .await
        .map_err(RoundtableError::from)?;
    Ok(Json(json!({ "status": "ok" })))
}

// ============================================================================
// Rooms
// ============================================================================

#[derive(Deserialize)]
struct CreateRoomBody {
    #[serde(default)]
    name: String,
}

async fn list_rooms(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rooms = state.store.get_rooms().await?;
    Ok(Json(rooms))
}

async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(RoundtableError::validation("Room name is required").into());
    }

    let room = state.store.create_room(name).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let room = state
        .store
        .get_room(id)
        .await?
        .ok_or(RoundtableError::RoomNotFound(id))?;
    Ok(Json(room))
}

async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete_room(id).await? {
        return Err(RoundtableError::RoomNotFound(id).into());
    }
    Ok(Json(json!({ "success": true })))
}

// ============================================================================
// Members
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMemberBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    repo_path: String,
    engine: Option<String>,
    context: Option<String>,
    api_key: Option<String>,
}

async fn list_members(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.store.get_members(room_id).await?;
    Ok(Json(members))
}

async fn create_member(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(body): Json<CreateMemberBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(RoundtableError::validation("Agent name is required").into());
    }

    let repo_path = body.repo_path.trim();
    if repo_path.is_empty() {
        return Err(RoundtableError::validation("Repository path is required").into());
    }

    // Resolve against the server's filesystem; the path must exist here
    // because the engine runs in that directory.
    let resolved = std::fs::canonicalize(repo_path)
        .map_err(|_| RoundtableError::InvalidRepoPath(repo_path.to_string()))?;

    let engine = parse_engine(body.engine.as_deref())?;
    let context = non_empty(body.context);

    let member = state
        .store
        .create_member(NewMember {
            room_id,
            name: name.to_string(),
            repo_path: resolved.to_string_lossy().into_owned(),
            engine,
            context: context.clone(),
            api_key: non_empty(body.api_key),
        })
        .await?;

    // The initial free-text context also becomes a manual source so it
    // shows up in the member's source list and feeds prompts from there.
    if let Some(text) = context {
        state
            .store
            .create_context_source(NewContextSource::manual(
                member.id,
                "Manual context",
                text,
            ))
            .await?;
    }

    Ok((StatusCode::CREATED, Json(member)))
}

async fn delete_member(
    State(state): State<AppState>,
    Path((_room_id, member_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_member(member_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody {
    ordered_ids: Vec<i64>,
}

async fn reorder_members(
    State(state): State<AppState>,
    Path(_room_id): Path<i64>,
    Json(body): Json<ReorderBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.reorder_members(&body.ordered_ids).await?;
    Ok(Json(json!({ "success": true })))
}

fn parse_engine(raw: Option<&str>) -> RoundtableResult<EngineKind> {
    match raw {
        None | Some("") => Ok(EngineKind::default()),
        Some(value) => value.parse(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Messages
// ============================================================================

async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .store
        .get_messages(room_id, MESSAGE_PAGE_LIMIT)
        .await?;
    Ok(Json(messages))
}

// ============================================================================
// Context sources
// ============================================================================

async fn list_context_sources(
    State(state): State<AppState>,
    Path((_room_id, member_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let sources = state.store.get_context_sources(member_id).await?;
    Ok(Json(sources))
}

/// JSON (`manual` | `url` | `notion`, tagged by `type`) or multipart
/// (`file` + `type` of `pdf`/`text_file`), matching the content type.
async fn create_context_source(
    State(state): State<AppState>,
    Path((_room_id, member_id)): Path<(i64, i64)>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| RoundtableError::validation(format!("Invalid upload: {}", e)))?;
        create_source_from_upload(state, member_id, multipart).await
    } else {
        let Json(body) = Json::<serde_json::Value>::from_request(request, &())
            .await
            .map_err(|e| RoundtableError::validation(format!("Invalid JSON: {}", e)))?;
        create_source_from_json(state, member_id, body).await
    }
}

async fn create_source_from_json(
    state: AppState,
    member_id: i64,
    body: serde_json::Value,
) -> Result<(StatusCode, Json<ContextSource>), ApiError> {
    let field = |name: &str| {
        body.get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let source = match body.get("type").and_then(|t| t.as_str()) {
        Some("manual") => {
            let content = field("content")
                .ok_or_else(|| RoundtableError::validation("Content is required"))?;
            let title = field("title").unwrap_or("Manual context");

            NewContextSource::manual(member_id, title, content)
        }
        Some("url") => {
            let url = field("url").ok_or_else(|| RoundtableError::validation("URL is required"))?;

            let extracted = state.url_extractor.extract(url).await?;
            NewContextSource {
                member_id,
                kind: SourceKind::Url,
                title: extracted.title,
                content: extracted.content,
                source_url: Some(url.to_string()),
                file_name: None,
            }
        }
        Some("notion") => {
            let url = field("url")
                .ok_or_else(|| RoundtableError::validation("Notion page URL is required"))?;
            let api_key = field("notionApiKey")
                .map(str::to_string)
                .or_else(|| {
                    std::env::var("NOTION_API_KEY")
                        .ok()
                        .filter(|k| !k.is_empty())
                })
                .ok_or_else(|| {
                    RoundtableError::MissingApiKey(
                        "Notion API key is required (set per-request or in .env)".to_string(),
                    )
                })?;

            let extracted = NotionExtractor::new(api_key).extract(url).await?;
            NewContextSource {
                member_id,
                kind: SourceKind::Notion,
                title: extracted.title,
                content: extracted.content,
                source_url: Some(url.to_string()),
                file_name: None,
            }
        }
        _ => return Err(RoundtableError::validation("Invalid source type").into()),
    };

    let created = state.store.create_context_source(source).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_source_from_upload(
    state: AppState,
    member_id: i64,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ContextSource>), ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut kind: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RoundtableError::validation(format!("Invalid upload: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| RoundtableError::validation(format!("Invalid upload: {}", e)))?;
                file = Some((file_name, data.to_vec()));
            }
            Some("type") => {
                kind = Some(field.text().await.map_err(|e| {
                    RoundtableError::validation(format!("Invalid upload: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| RoundtableError::validation("No file provided"))?;
    if data.len() > MAX_FILE_SIZE {
        return Err(RoundtableError::validation("File too large (max 10MB)").into());
    }

    let (source_kind, content) = match kind.as_deref() {
        Some("text_file") => (SourceKind::TextFile, extract_text_file(&data)),
        Some("pdf") => (SourceKind::Pdf, extract_pdf(&data)?),
        _ => return Err(RoundtableError::validation("Invalid file type").into()),
    };

    if content.is_empty() {
        return Err(RoundtableError::EmptyExtraction.into());
    }

    let created = state
        .store
        .create_context_source(NewContextSource {
            member_id,
            kind: source_kind,
            title: file_name.clone(),
            content,
            source_url: None,
            file_name: Some(file_name),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_context_source(
    State(state): State<AppState>,
    Path((_room_id, _member_id, source_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_context_source(source_id).await?;
    Ok(Json(json!({ "success": true })))
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    #[serde(default)]
    content: String,
    target_member_id: Option<i64>,
}

async fn chat(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(body): Json<ChatBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let events = state
        .orchestrator
        .run_round(room_id, &body.content, body.target_member_id)
        .await?;

    let frames = events.filter_map(|event| async move {
        Event::default()
            .json_data(&event)
            .ok()
            .map(Ok::<Event, Infallible>)
    });

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

// ============================================================================
// Tests
// ============================================================================

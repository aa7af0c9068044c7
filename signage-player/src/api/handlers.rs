//! HTTP request handlers
//!
//! Errors are returned as `{"status": "error", "message": ...}` with a
//! 400, 404 or 500 status code. Extractor rejections are reported the same
//! way as 400s.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use signage_common::{ContentDescriptor, ContentId, PlayerState};

use crate::api::server::AppContext;
use crate::content_store::ContentStore;
use crate::error::Error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistUpdatedResponse {
    pub status: String,
    pub content_ids: Vec<ContentId>,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WebContentRequest {
    #[serde(default)]
    name: String,
    url: String,
    duration: Option<u32>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::BadRequest(_) | Error::UnsupportedType(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: err.to_string(),
        }),
    )
}

/// Extractor rejection (bad query string, malformed body) as a 400
fn rejected(rejection: impl std::fmt::Display) -> ApiError {
    api_error(Error::BadRequest(rejection.to_string()))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "signage-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Content Endpoints
// ============================================================================

/// GET /api/content - All registered descriptors
pub async fn list_content(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<ContentDescriptor>>> {
    let contents = ctx.scheduler.contents().await.map_err(api_error)?;
    Ok(Json(contents))
}

/// POST /api/content/upload - Store and register an image or video
///
/// Multipart field `file` carries the upload. The slot duration comes from
/// a `duration` form field, else the `duration` query parameter, else the
/// configured default.
pub async fn upload_content(
    State(ctx): State<AppContext>,
    params: Result<Query<UploadParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ContentDescriptor>> {
    let Query(params) = params.map_err(rejected)?;
    let mut multipart = multipart.map_err(rejected)?;
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut form_duration: Option<u32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(Error::BadRequest(format!("Malformed upload: {}", e))))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(Error::BadRequest(format!("Failed to read upload: {}", e))))?;
                file = Some((filename, mime, bytes.to_vec()));
            }
            "duration" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(Error::BadRequest(e.to_string())))?;
                let duration = text.trim().parse::<u32>().map_err(|_| {
                    api_error(Error::BadRequest(format!("Invalid duration '{}'", text.trim())))
                })?;
                form_duration = Some(duration);
            }
            other => debug!("Ignoring upload field '{}'", other),
        }
    }

    let (filename, mime, bytes) =
        file.ok_or_else(|| api_error(Error::BadRequest("Missing multipart field 'file'".to_string())))?;

    let duration = form_duration
        .or(params.duration)
        .unwrap_or(ctx.config.default_duration_secs);

    info!("Upload '{}' ({}, {} bytes, {}s)", filename, mime, bytes.len(), duration);

    let content = ctx
        .store
        .ingest(&filename, &mime, &bytes, duration)
        .await
        .map_err(api_error)?;

    if let Err(e) = ctx.scheduler.add_content(content.clone()).await {
        // Registration failed: leave no orphan file behind
        discard_unreferenced(&ctx, &content).await;
        return Err(api_error(e));
    }

    Ok(Json(content))
}

/// POST /api/content/web - Register a web page
pub async fn add_web_content(
    State(ctx): State<AppContext>,
    req: Result<Json<WebContentRequest>, JsonRejection>,
) -> ApiResult<Json<ContentDescriptor>> {
    let Json(req) = req.map_err(rejected)?;
    let duration = req.duration.unwrap_or(ctx.config.default_duration_secs);
    let content = ContentStore::web(&req.name, &req.url, duration).map_err(api_error)?;

    ctx.scheduler
        .add_content(content.clone())
        .await
        .map_err(api_error)?;

    Ok(Json(content))
}

/// DELETE /api/content/:id - Unregister content and delete its file
pub async fn delete_content(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let not_found = || api_error(Error::NotFound(format!("Content {}", id)));

    let content_id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let removed = ctx
        .scheduler
        .remove_content(content_id)
        .await
        .map_err(api_error)?
        .ok_or_else(not_found)?;

    discard_unreferenced(&ctx, &removed).await;

    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

/// Delete the stored file of `content` unless a registered descriptor still uses it
///
/// Identical uploads share one stored file. When the registry cannot be
/// read the file is kept.
async fn discard_unreferenced(ctx: &AppContext, content: &ContentDescriptor) {
    let still_referenced = match ctx.scheduler.contents().await {
        Ok(contents) => contents
            .iter()
            .any(|c| c.id != content.id && c.path == content.path),
        Err(e) => {
            warn!("Could not check other references to {}: {}", content.path, e);
            true
        }
    };

    if still_referenced {
        debug!("Keeping {}: still referenced", content.path);
    } else {
        ctx.store.discard(content).await;
    }
}

// ============================================================================
// Playlist / Player Endpoints
// ============================================================================

/// GET /api/playlist - Stored playlist ids
pub async fn get_playlist(State(ctx): State<AppContext>) -> Json<Vec<ContentId>> {
    Json(ctx.scheduler.playlist().await)
}

/// POST /api/playlist - Replace the playlist
///
/// Body is a bare JSON array of content ids. Ids that do not parse or are
/// not registered are dropped.
pub async fn set_playlist(
    State(ctx): State<AppContext>,
    ids: Result<Json<Vec<String>>, JsonRejection>,
) -> ApiResult<Json<PlaylistUpdatedResponse>> {
    let Json(ids) = ids.map_err(rejected)?;
    let parsed: Vec<ContentId> = ids
        .iter()
        .filter_map(|raw| match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                debug!("Dropping unparseable playlist id '{}'", raw);
                None
            }
        })
        .collect();

    let content_ids = ctx.scheduler.set_playlist(parsed).await.map_err(api_error)?;

    Ok(Json(PlaylistUpdatedResponse {
        status: "updated".to_string(),
        content_ids,
    }))
}

/// GET /api/player - Player state snapshot
pub async fn get_player_state(State(ctx): State<AppContext>) -> Json<PlayerState> {
    Json(ctx.scheduler.player_state().await)
}

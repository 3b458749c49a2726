use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use horizon_core::config::{
    FieldKind, OverrideRecord, ResolvedValue, ScopeLevel, ScopePath,
};
use horizon_core::error::ApiError;

use crate::auth::AdminToken;
use crate::defaults::{FIELD_INSTRUCTIONS, field_kind};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/chat-config", get(get_chat_config))
        .route(
            "/api/admin/chat-config/pages/{page}",
            get(get_page_config)
                .put(put_page_override)
                .delete(delete_page_override),
        )
        .route(
            "/api/admin/chat-config/streams/{stream_id}",
            get(get_stream_config)
                .put(put_stream_config)
                .delete(delete_stream_config),
        )
}

/// One configuration field at one scope: its resolution kind, the effective
/// value after precedence, and the override stored at exactly this scope.
#[derive(Debug, Serialize, ToSchema)]
pub struct FieldConfig {
    pub field_key: String,
    pub kind: FieldKind,
    pub resolved: ResolvedValue,
    pub record: OverrideRecord,
}

/// Resolved configuration for one scope path.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScopeConfig {
    pub scope_path: ScopePath,
    pub level: ScopeLevel,
    pub fields: Vec<FieldConfig>,
}

/// All scopes registered under one page.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageConfig {
    pub page: String,
    pub scopes: Vec<ScopeConfig>,
}

/// A stream's instruction overlay as stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct StreamOverlay {
    pub stream_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub has_override: bool,
}

/// Full snapshot of the chat-assistant configuration: every registered page
/// with resolved values and override flags, plus every stream overlay.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatConfigResponse {
    pub pages: Vec<PageConfig>,
    pub streams: Vec<StreamOverlay>,
}

fn scope_config(
    store: &horizon_core::config::ConfigStore,
    path: &ScopePath,
) -> Result<ScopeConfig, AppError> {
    let mut fields = Vec::new();
    for field_key in store.registered_fields(path) {
        let resolved = store.resolve(path, &field_key)?;
        let record = store.override_record(path, &field_key);
        fields.push(FieldConfig {
            kind: field_kind(&field_key),
            field_key,
            resolved,
            record,
        });
    }
    Ok(ScopeConfig {
        scope_path: path.clone(),
        level: path.level(),
        fields,
    })
}

/// Full chat-assistant configuration snapshot
///
/// One call gives the admin console everything it renders: every registered
/// page/tab/subtab with effective values and custom-vs-inherited flags, and
/// every stream instruction overlay.
#[utoipa::path(
    get,
    path = "/api/admin/chat-config",
    responses(
        (status = 200, description = "Full configuration snapshot", body = ChatConfigResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn get_chat_config(
    State(state): State<AppState>,
    _admin: AdminToken,
) -> Result<Json<ChatConfigResponse>, AppError> {
    let store = state.config.read().await;

    let mut pages = Vec::new();
    for page in store.registered_pages() {
        let mut scopes = Vec::new();
        for path in store.registered_scopes(&page) {
            scopes.push(scope_config(&store, &path)?);
        }
        pages.push(PageConfig { page, scopes });
    }

    let streams = store
        .stream_ids()
        .into_iter()
        .map(|stream_id| {
            let instructions = store.stream_instructions(&stream_id).map(String::from);
            StreamOverlay {
                stream_id,
                has_override: instructions.is_some(),
                instructions,
            }
        })
        .collect();

    Ok(Json(ChatConfigResponse { pages, streams }))
}

/// Narrows a page request to a tab or subtab scope.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ScopeQuery {
    pub tab: Option<String>,
    pub subtab: Option<String>,
}

/// Resolved configuration for one scope path
///
/// Returns effective values plus the override stored at exactly this scope,
/// so the console can show a custom/inherited badge per field. Unregistered
/// pages still resolve through the global defaults.
#[utoipa::path(
    get,
    path = "/api/admin/chat-config/pages/{page}",
    params(
        ("page" = String, Path, description = "Page name (e.g. 'reports')"),
        ScopeQuery
    ),
    responses(
        (status = 200, description = "Resolved scope configuration", body = ScopeConfig),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No default registered anywhere in the scope chain", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn get_page_config(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(page): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ScopeConfig>, AppError> {
    let path = ScopePath::new(page, query.tab, query.subtab)?;
    let store = state.config.read().await;
    Ok(Json(scope_config(&store, &path)?))
}

/// Request body for PUT /api/admin/chat-config/pages/{page}.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetOverrideRequest {
    /// Which field to override (e.g. "identity")
    pub field_key: String,
    /// Raw value. Trimmed on save; whitespace-only clears the override.
    pub value: String,
    pub tab: Option<String>,
    pub subtab: Option<String>,
}

/// Stored override plus the value `resolve` now returns for the same path.
#[derive(Debug, Serialize, ToSchema)]
pub struct OverrideUpdateResponse {
    pub record: OverrideRecord,
    pub resolved: ResolvedValue,
}

/// Save an override at a page, tab, or subtab scope
///
/// The value is trimmed before storing; an empty or whitespace-only value is
/// stored as "no override" and resolution falls back to the default. Saving
/// the same value twice is idempotent.
#[utoipa::path(
    put,
    path = "/api/admin/chat-config/pages/{page}",
    params(("page" = String, Path, description = "Page name")),
    request_body = SetOverrideRequest,
    responses(
        (status = 200, description = "Override stored", body = OverrideUpdateResponse),
        (status = 400, description = "Invalid scope path or field", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No default registered anywhere in the scope chain", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn put_page_override(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(page): Path<String>,
    AppJson(req): AppJson<SetOverrideRequest>,
) -> Result<Json<OverrideUpdateResponse>, AppError> {
    if req.field_key.trim().is_empty() {
        return Err(AppError::Validation {
            message: "field_key must not be empty".to_string(),
            field: Some("field_key".to_string()),
            received: Some(serde_json::Value::String(req.field_key)),
            docs_hint: None,
        });
    }
    if req.field_key == FIELD_INSTRUCTIONS {
        return Err(AppError::Validation {
            message: "stream instructions are saved per stream, not per page".to_string(),
            field: Some("field_key".to_string()),
            received: Some(serde_json::Value::String(req.field_key)),
            docs_hint: Some(
                "Use PUT /api/admin/chat-config/streams/{id} for the instruction overlay."
                    .to_string(),
            ),
        });
    }

    let path = ScopePath::new(page, req.tab, req.subtab)?;
    let mut store = state.config.write().await;

    // Resolving first ensures the field exists somewhere in the chain before
    // an override is stored for it.
    store.resolve(&path, &req.field_key)?;
    let record = store.set_override(&path, &req.field_key, &req.value);
    let resolved = store.resolve(&path, &req.field_key)?;

    tracing::info!(scope = %path, field = %req.field_key, has_override = record.has_override, "config override saved");
    Ok(Json(OverrideUpdateResponse { record, resolved }))
}

/// Identifies the override to clear.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ClearOverrideQuery {
    pub field_key: String,
    pub tab: Option<String>,
    pub subtab: Option<String>,
}

/// Response for DELETE on a config scope.
#[derive(Debug, Serialize, ToSchema)]
pub struct OverrideClearedResponse {
    /// False when there was no override to clear (a no-op, not an error).
    pub cleared: bool,
    pub resolved: ResolvedValue,
}

/// Clear an override so resolution falls back to the default
///
/// Clearing an override that does not exist is a no-op.
#[utoipa::path(
    delete,
    path = "/api/admin/chat-config/pages/{page}",
    params(
        ("page" = String, Path, description = "Page name"),
        ClearOverrideQuery
    ),
    responses(
        (status = 200, description = "Override cleared (or nothing to clear)", body = OverrideClearedResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No default registered anywhere in the scope chain", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn delete_page_override(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(page): Path<String>,
    Query(query): Query<ClearOverrideQuery>,
) -> Result<Json<OverrideClearedResponse>, AppError> {
    let path = ScopePath::new(page, query.tab, query.subtab)?;
    let mut store = state.config.write().await;

    let cleared = store.clear_override(&path, &query.field_key);
    let resolved = store.resolve(&path, &query.field_key)?;

    tracing::info!(scope = %path, field = %query.field_key, cleared, "config override cleared");
    Ok(Json(OverrideClearedResponse { cleared, resolved }))
}

/// Which page's identity the stream prompt is layered onto.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StreamPageQuery {
    /// Defaults to "reports", the page research streams render on.
    pub page: Option<String>,
}

/// A stream's overlay plus the fully composed prompt.
#[derive(Debug, Serialize, ToSchema)]
pub struct StreamConfigResponse {
    pub stream_id: String,
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub has_override: bool,
    /// Page identity first, then the stream instructions. The overlay is
    /// additive: it never replaces the page persona.
    pub effective_prompt: String,
    pub source: ScopeLevel,
}

const DEFAULT_STREAM_PAGE: &str = "reports";

async fn stream_response(
    state: &AppState,
    stream_id: String,
    page: Option<String>,
) -> Result<StreamConfigResponse, AppError> {
    let page = page.unwrap_or_else(|| DEFAULT_STREAM_PAGE.to_string());
    let store = state.config.read().await;
    let page_path = ScopePath::page(page.clone());
    let effective_prompt = store.effective_stream_prompt(&stream_id, &page_path)?;
    let instructions = store.stream_instructions(&stream_id).map(String::from);
    let has_override = instructions.is_some();
    Ok(StreamConfigResponse {
        stream_id,
        page,
        instructions,
        has_override,
        effective_prompt,
        source: if has_override {
            ScopeLevel::StreamInstruction
        } else {
            ScopeLevel::Page
        },
    })
}

/// Get a stream's instruction overlay and composed prompt
#[utoipa::path(
    get,
    path = "/api/admin/chat-config/streams/{stream_id}",
    params(
        ("stream_id" = String, Path, description = "Research stream id"),
        StreamPageQuery
    ),
    responses(
        (status = 200, description = "Stream overlay", body = StreamConfigResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No identity default for the page", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn get_stream_config(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(stream_id): Path<String>,
    Query(query): Query<StreamPageQuery>,
) -> Result<Json<StreamConfigResponse>, AppError> {
    Ok(Json(stream_response(&state, stream_id, query.page).await?))
}

/// Request body for PUT /api/admin/chat-config/streams/{id}.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStreamInstructionsRequest {
    /// Raw overlay text. Trimmed on save; whitespace-only clears it.
    pub instructions: String,
    /// Page whose identity the composed prompt is previewed against.
    pub page: Option<String>,
}

/// Save a stream's instruction overlay
///
/// Same trim semantics as page overrides: whitespace-only means "no overlay".
#[utoipa::path(
    put,
    path = "/api/admin/chat-config/streams/{stream_id}",
    params(("stream_id" = String, Path, description = "Research stream id")),
    request_body = SetStreamInstructionsRequest,
    responses(
        (status = 200, description = "Overlay stored", body = StreamConfigResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No identity default for the page", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn put_stream_config(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(stream_id): Path<String>,
    AppJson(req): AppJson<SetStreamInstructionsRequest>,
) -> Result<Json<StreamConfigResponse>, AppError> {
    {
        let mut store = state.config.write().await;
        store.set_stream_instructions(&stream_id, &req.instructions);
    }
    tracing::info!(stream_id = %stream_id, "stream instructions saved");
    Ok(Json(stream_response(&state, stream_id, req.page).await?))
}

/// Clear a stream's instruction overlay
#[utoipa::path(
    delete,
    path = "/api/admin/chat-config/streams/{stream_id}",
    params(
        ("stream_id" = String, Path, description = "Research stream id"),
        StreamPageQuery
    ),
    responses(
        (status = 200, description = "Overlay cleared (or nothing to clear)", body = StreamConfigResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "chat-config"
)]
pub async fn delete_stream_config(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(stream_id): Path<String>,
    Query(query): Query<StreamPageQuery>,
) -> Result<Json<StreamConfigResponse>, AppError> {
    {
        let mut store = state.config.write().await;
        store.clear_stream_instructions(&stream_id);
    }
    tracing::info!(stream_id = %stream_id, "stream instructions cleared");
    Ok(Json(stream_response(&state, stream_id, query.page).await?))
}

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use horizon_core::curation::{
    CandidateItem, PipelineDecision, ReportContentState, ReportCuration,
};
use horizon_core::error::ApiError;

use crate::auth::AdminToken;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/reports/{report_id}/curation",
            get(get_curation).put(load_curation),
        )
        .route(
            "/api/reports/{report_id}/items/{item_id}/include",
            post(include_item),
        )
        .route(
            "/api/reports/{report_id}/items/{item_id}/exclude",
            post(exclude_item),
        )
        .route(
            "/api/reports/{report_id}/items/{item_id}/reset",
            post(reset_item),
        )
}

/// Everything the curation view renders: the candidate list with effective
/// states plus aggregate counts recomputed from the full set.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurationViewResponse {
    pub report_id: Uuid,
    pub items: Vec<CandidateItem>,
    pub state: ReportContentState,
}

/// One candidate as produced by the pipeline. Curator fields are not
/// accepted here — ingestion always starts clean.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CandidateSeed {
    /// Stable id; generated when omitted.
    pub id: Option<Uuid>,
    pub title: String,
    pub url: Option<String>,
    pub pipeline_decision: PipelineDecision,
    pub pipeline_score: f64,
    pub pipeline_reason: String,
}

/// Request body for PUT /api/reports/{id}/curation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadCurationRequest {
    pub items: Vec<CandidateSeed>,
}

/// A mutated item plus the freshly recomputed aggregate. Counts are always
/// recomputed from the full candidate set, never patched incrementally.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurationItemResponse {
    pub item: CandidateItem,
    pub state: ReportContentState,
}

/// Response for the explicit undo action.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurationResetResponse {
    /// False when there was no curator decision to clear — a signalled
    /// no-op, not an error.
    pub reset: bool,
    pub item: CandidateItem,
    pub state: ReportContentState,
}

/// Get the curation view for a report
#[utoipa::path(
    get,
    path = "/api/reports/{report_id}/curation",
    params(("report_id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Curation view", body = CurationViewResponse),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "curation"
)]
pub async fn get_curation(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(report_id): Path<Uuid>,
) -> Result<Json<CurationViewResponse>, AppError> {
    let reports = state.reports.read().await;
    let report = reports.get(&report_id).ok_or_else(|| AppError::NotFound {
        resource: format!("report {report_id}"),
    })?;

    Ok(Json(CurationViewResponse {
        report_id,
        items: report.items.clone(),
        state: report.content_state(),
    }))
}

/// Load (or replace) a report's candidate set from the pipeline
///
/// This is the ingestion surface the generation pipeline writes to. Replacing
/// a candidate set discards any curator decisions on the previous set.
#[utoipa::path(
    put,
    path = "/api/reports/{report_id}/curation",
    params(("report_id" = Uuid, Path, description = "Report id")),
    request_body = LoadCurationRequest,
    responses(
        (status = 200, description = "Candidate set stored", body = CurationViewResponse),
        (status = 400, description = "Invalid candidate", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "curation"
)]
pub async fn load_curation(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(report_id): Path<Uuid>,
    AppJson(req): AppJson<LoadCurationRequest>,
) -> Result<Json<CurationViewResponse>, AppError> {
    let items: Vec<CandidateItem> = req
        .items
        .into_iter()
        .map(|seed| {
            CandidateItem::new(
                seed.id.unwrap_or_else(Uuid::now_v7),
                seed.title,
                seed.url,
                seed.pipeline_decision,
                seed.pipeline_score,
                seed.pipeline_reason,
            )
        })
        .collect();

    let mut duplicate_check = std::collections::HashSet::new();
    for item in &items {
        if !duplicate_check.insert(item.id) {
            return Err(AppError::Validation {
                message: format!("candidate id {} appears more than once", item.id),
                field: Some("items".to_string()),
                received: Some(serde_json::Value::String(item.id.to_string())),
                docs_hint: None,
            });
        }
    }

    let report = ReportCuration::new(report_id, items);
    let response = CurationViewResponse {
        report_id,
        items: report.items.clone(),
        state: report.content_state(),
    };

    let mut reports = state.reports.write().await;
    reports.insert(report_id, report);
    tracing::info!(report_id = %report_id, total = response.state.total, "candidate set loaded");
    Ok(Json(response))
}

/// Request body for the include action. `{}` is valid — the category is
/// optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IncludeItemRequest {
    /// Editorial category to file the article under.
    pub category: Option<String>,
}

/// Pull an article into the report
///
/// Including an article the pipeline already included clears any curator
/// override instead of storing a redundant one, so the item reads as
/// pipeline-decided again.
#[utoipa::path(
    post,
    path = "/api/reports/{report_id}/items/{item_id}/include",
    params(
        ("report_id" = Uuid, Path, description = "Report id"),
        ("item_id" = Uuid, Path, description = "Candidate item id")
    ),
    request_body = IncludeItemRequest,
    responses(
        (status = 200, description = "Item included", body = CurationItemResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Report or item not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "curation"
)]
pub async fn include_item(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path((report_id, item_id)): Path<(Uuid, Uuid)>,
    AppJson(req): AppJson<IncludeItemRequest>,
) -> Result<Json<CurationItemResponse>, AppError> {
    let category = req.category;

    let mut reports = state.reports.write().await;
    let report = reports
        .get_mut(&report_id)
        .ok_or_else(|| AppError::NotFound {
            resource: format!("report {report_id}"),
        })?;

    let item = report.include(item_id, category)?;
    let state_counts = report.content_state();
    tracing::info!(report_id = %report_id, item_id = %item_id, "curator include");
    Ok(Json(CurationItemResponse {
        item,
        state: state_counts,
    }))
}

/// Drop an article from the report
///
/// Excluding an article the pipeline already excluded (or flagged duplicate)
/// clears any curator override instead of storing a redundant one.
#[utoipa::path(
    post,
    path = "/api/reports/{report_id}/items/{item_id}/exclude",
    params(
        ("report_id" = Uuid, Path, description = "Report id"),
        ("item_id" = Uuid, Path, description = "Candidate item id")
    ),
    responses(
        (status = 200, description = "Item excluded", body = CurationItemResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Report or item not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "curation"
)]
pub async fn exclude_item(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path((report_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CurationItemResponse>, AppError> {
    let mut reports = state.reports.write().await;
    let report = reports
        .get_mut(&report_id)
        .ok_or_else(|| AppError::NotFound {
            resource: format!("report {report_id}"),
        })?;

    let item = report.exclude(item_id)?;
    let state_counts = report.content_state();
    tracing::info!(report_id = %report_id, item_id = %item_id, "curator exclude");
    Ok(Json(CurationItemResponse {
        item,
        state: state_counts,
    }))
}

/// Revert an item to the pipeline's original decision
///
/// The explicit undo: unconditionally clears the curator decision. When there
/// is nothing to clear the response carries `reset: false` — never an error.
#[utoipa::path(
    post,
    path = "/api/reports/{report_id}/items/{item_id}/reset",
    params(
        ("report_id" = Uuid, Path, description = "Report id"),
        ("item_id" = Uuid, Path, description = "Candidate item id")
    ),
    responses(
        (status = 200, description = "Item reverted (or nothing to revert)", body = CurationResetResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Report or item not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "curation"
)]
pub async fn reset_item(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path((report_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CurationResetResponse>, AppError> {
    let mut reports = state.reports.write().await;
    let report = reports
        .get_mut(&report_id)
        .ok_or_else(|| AppError::NotFound {
            resource: format!("report {report_id}"),
        })?;

    let outcome = report.reset(item_id)?;
    let state_counts = report.content_state();
    tracing::info!(report_id = %report_id, item_id = %item_id, reset = outcome.reset, "curator reset");
    Ok(Json(CurationResetResponse {
        reset: outcome.reset,
        item: outcome.item,
        state: state_counts,
    }))
}

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use horizon_core::error::ApiError;

use crate::auth::AdminToken;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::{AppState, Organization};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/orgs", get(list_orgs).post(create_org))
        .route("/api/admin/orgs/{org_id}", get(get_org))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrgListResponse {
    pub orgs: Vec<Organization>,
}

/// Request body for POST /api/admin/orgs.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrgRequest {
    pub name: String,
    /// URL-safe identifier; derived from the name when omitted.
    pub slug: Option<String>,
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

/// List tenant organizations
#[utoipa::path(
    get,
    path = "/api/admin/orgs",
    responses(
        (status = 200, description = "All organizations", body = OrgListResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "orgs"
)]
pub async fn list_orgs(
    State(state): State<AppState>,
    _admin: AdminToken,
) -> Result<Json<OrgListResponse>, AppError> {
    let orgs = state.orgs.read().await;
    Ok(Json(OrgListResponse { orgs: orgs.clone() }))
}

/// Create a tenant organization
#[utoipa::path(
    post,
    path = "/api/admin/orgs",
    request_body = CreateOrgRequest,
    responses(
        (status = 200, description = "Organization created", body = Organization),
        (status = 400, description = "Invalid name or duplicate slug", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "orgs"
)]
pub async fn create_org(
    State(state): State<AppState>,
    _admin: AdminToken,
    AppJson(req): AppJson<CreateOrgRequest>,
) -> Result<Json<Organization>, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation {
            message: "name must not be empty".to_string(),
            field: Some("name".to_string()),
            received: Some(serde_json::Value::String(req.name)),
            docs_hint: None,
        });
    }

    let slug = match req.slug {
        Some(s) => s.trim().to_string(),
        None => slugify(&name),
    };
    if slug.is_empty() {
        return Err(AppError::Validation {
            message: "slug must contain at least one alphanumeric character".to_string(),
            field: Some("slug".to_string()),
            received: Some(serde_json::Value::String(slug)),
            docs_hint: None,
        });
    }

    let mut orgs = state.orgs.write().await;
    if orgs.iter().any(|o| o.slug == slug) {
        return Err(AppError::Validation {
            message: format!("an organization with slug '{slug}' already exists"),
            field: Some("slug".to_string()),
            received: Some(serde_json::Value::String(slug)),
            docs_hint: None,
        });
    }

    let org = Organization {
        id: Uuid::now_v7(),
        name,
        slug,
        created_at: Utc::now(),
    };
    orgs.push(org.clone());
    tracing::info!(org_id = %org.id, slug = %org.slug, "organization created");
    Ok(Json(org))
}

/// Get one organization by id
#[utoipa::path(
    get,
    path = "/api/admin/orgs/{org_id}",
    params(("org_id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization", body = Organization),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Organization not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "orgs"
)]
pub async fn get_org(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Organization>, AppError> {
    let orgs = state.orgs.read().await;
    orgs.iter()
        .find(|o| o.id == org_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            resource: format!("organization {org_id}"),
        })
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Meridian Health Group"), "meridian-health-group");
    }

    #[test]
    fn slugify_collapses_runs_of_separators() {
        assert_eq!(slugify("Acme -- Labs!!"), "acme-labs");
    }

    #[test]
    fn slugify_of_symbols_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }
}

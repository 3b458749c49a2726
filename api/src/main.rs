use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod auth;
mod defaults;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Knowledge Horizon API",
        version = "0.1.0",
        description = "Backend for the Knowledge Horizon admin console: chat-assistant \
                       configuration, report curation, and organization management."
    ),
    paths(
        routes::health::health_check,
        routes::chat_config::get_chat_config,
        routes::chat_config::get_page_config,
        routes::chat_config::put_page_override,
        routes::chat_config::delete_page_override,
        routes::chat_config::get_stream_config,
        routes::chat_config::put_stream_config,
        routes::chat_config::delete_stream_config,
        routes::curation::get_curation,
        routes::curation::load_curation,
        routes::curation::include_item,
        routes::curation::exclude_item,
        routes::curation::reset_item,
        routes::orgs::list_orgs,
        routes::orgs::create_org,
        routes::orgs::get_org,
    ),
    components(schemas(
        HealthResponse,
        horizon_core::error::ApiError,
        horizon_core::config::ScopeLevel,
        horizon_core::config::ScopePath,
        horizon_core::config::FieldKind,
        horizon_core::config::OverrideRecord,
        horizon_core::config::ResolvedValue,
        horizon_core::curation::PipelineDecision,
        horizon_core::curation::CuratorDecision,
        horizon_core::curation::EffectiveState,
        horizon_core::curation::CandidateItem,
        horizon_core::curation::ReportContentState,
        routes::chat_config::FieldConfig,
        routes::chat_config::ScopeConfig,
        routes::chat_config::PageConfig,
        routes::chat_config::StreamOverlay,
        routes::chat_config::ChatConfigResponse,
        routes::chat_config::SetOverrideRequest,
        routes::chat_config::OverrideUpdateResponse,
        routes::chat_config::OverrideClearedResponse,
        routes::chat_config::SetStreamInstructionsRequest,
        routes::chat_config::StreamConfigResponse,
        routes::curation::CurationViewResponse,
        routes::curation::CandidateSeed,
        routes::curation::LoadCurationRequest,
        routes::curation::IncludeItemRequest,
        routes::curation::CurationItemResponse,
        routes::curation::CurationResetResponse,
        routes::orgs::OrgListResponse,
        routes::orgs::CreateOrgRequest,
        crate::state::Organization,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "horizon_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Admin token is optional: unset means open dev mode.
    let admin_token_hash = std::env::var("HORIZON_ADMIN_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .map(|t| horizon_core::auth::hash_token(t.trim()));
    if admin_token_hash.is_none() {
        tracing::warn!("HORIZON_ADMIN_TOKEN not set; admin endpoints are unauthenticated");
    }

    let app_state = state::AppState::new(defaults::seed_config(), admin_token_hash);

    let cors_layer = middleware::cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::chat_config::router().layer(middleware::rate_limit::admin_layer()))
        .merge(routes::orgs::router().layer(middleware::rate_limit::admin_layer()))
        .merge(routes::curation::router().layer(middleware::rate_limit::curation_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Knowledge Horizon API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

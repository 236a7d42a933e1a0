use crate::config::AppConfig;
use crate::controller::{Dashboard, EventEnvelope, Outcome, View};
use crate::error::SelectionError;
use crate::session::SessionRegistry;
use crate::types::Indicator;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub type AppState = Arc<SessionRegistry>;

pub enum ApiError {
    InvalidSelection(SelectionError),
    SessionNotFound(Uuid),
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        ApiError::InvalidSelection(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::InvalidSelection(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.kind(), err.to_string()),
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "session_not_found",
                format!("session {} does not exist or has expired", id),
            ),
        };
        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}

#[derive(Serialize)]
pub struct OptionItem<T> {
    pub value: T,
    pub label: String,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub years: Vec<i32>,
    pub districts: Vec<OptionItem<u32>>,
    pub indicators: Vec<OptionItem<String>>,
    pub default_year: i32,
    pub default_indicator: String,
}

#[derive(Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub view: View,
}

#[derive(Deserialize)]
pub struct LocationQuery {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct DistrictAt {
    pub code: u32,
    pub name: String,
}

pub fn create_router(registry: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/options", get(options_handler))
        .route("/api/geojson", get(geojson_handler))
        .route("/api/districts/at", get(district_at_handler))
        .route("/api/sessions", post(create_session_handler))
        .route(
            "/api/sessions/:id",
            get(session_view_handler).delete(delete_session_handler),
        )
        .route("/api/sessions/:id/events", post(event_handler))
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

pub async fn start_server(config: AppConfig, dashboard: Dashboard) -> Result<()> {
    let registry = Arc::new(SessionRegistry::new(Arc::new(dashboard), &config.server));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let app = create_router(registry, &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn options_handler(State(registry): State<AppState>) -> Json<OptionsResponse> {
    let dashboard = registry.dashboard();
    let store = dashboard.store();
    let initial = dashboard.initial_state();

    let districts = store
        .regions()
        .iter()
        .map(|r| OptionItem {
            value: r.code,
            label: r.name.clone(),
        })
        .collect();

    let indicators = Indicator::ALL
        .iter()
        .map(|i| OptionItem {
            value: i.key().to_string(),
            label: i.label().to_string(),
        })
        .collect();

    Json(OptionsResponse {
        years: store.years().iter().copied().collect(),
        districts,
        indicators,
        default_year: initial.year,
        default_indicator: initial.indicator.key().to_string(),
    })
}

async fn geojson_handler(State(registry): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/geo+json")],
        registry.dashboard().store().boundary_json(),
    )
}

async fn district_at_handler(
    State(registry): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Json<Option<DistrictAt>> {
    let found = registry
        .dashboard()
        .store()
        .district_at(params.lat, params.lon)
        .map(|region| DistrictAt {
            code: region.code,
            name: region.name.clone(),
        });
    Json(found)
}

async fn create_session_handler(State(registry): State<AppState>) -> Response {
    let (session_id, view) = registry.create();
    (StatusCode::CREATED, Json(SessionCreated { session_id, view })).into_response()
}

async fn session_view_handler(
    State(registry): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<View>, ApiError> {
    registry.view(&id).map(Json).ok_or(ApiError::SessionNotFound(id))
}

async fn event_handler(
    State(registry): State<AppState>,
    Path(id): Path<Uuid>,
    Json(envelope): Json<EventEnvelope>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = registry
        .handle(&id, envelope)
        .ok_or(ApiError::SessionNotFound(id))??;
    Ok(Json(outcome))
}

async fn delete_session_handler(
    State(registry): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if registry.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{startup::AppState, version::BuildInfo};

#[derive(Serialize)]
struct HealthBody<'a> {
    ok: bool,
    #[serde(flatten)]
    build: &'a BuildInfo,
}

/// GET / - liveness plus build metadata.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthBody {
        ok: true,
        build: state.build_info.as_ref(),
    })
    .into_response()
}

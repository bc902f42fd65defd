use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};

use faena_core::{ApiCreated, ApiResult, Envelope};

use crate::model::{Decomiso, NuevoDecomiso, ResumenDecomisos};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/faenas/{id}/decomisos", post(record_decomiso).get(list_decomisos))
        .route("/faenas/{id}/decomisos/resumen", get(resumen_decomisos))
}

async fn record_decomiso(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<NuevoDecomiso>, JsonRejection>,
) -> ApiCreated<Decomiso> {
    let Path(faena_id) = path?;
    let Json(body) = body?;
    Ok(Envelope::created(svc.record_decomiso(faena_id, body)?, "decomiso recorded"))
}

async fn list_decomisos(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Decomiso>> {
    let Path(faena_id) = path?;
    Ok(Envelope::success(svc.list_decomisos(faena_id)?))
}

async fn resumen_decomisos(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<ResumenDecomisos> {
    let Path(faena_id) = path?;
    Ok(Envelope::success(svc.resumen_decomisos(faena_id)?))
}

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use faena_core::{ApiCreated, ApiResult, Envelope, PageParams};

use crate::model::{CantidadDeclarada, NuevaTropa, Tropa, TropaFilters};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tropas", post(create_tropa).get(list_tropas))
        .route("/tropas/{id}", get(get_tropa).patch(update_tropa))
        .route("/tropas/{id}/detalles/{detalle_id}", patch(update_detalle))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TropaQuery {
    page: Option<usize>,
    limit: Option<usize>,
    titular_faena_id: Option<i64>,
    numero: Option<String>,
}

async fn create_tropa(
    State(svc): State<AppState>,
    body: Result<Json<NuevaTropa>, JsonRejection>,
) -> ApiCreated<Tropa> {
    let Json(body) = body?;
    let tropa = svc.create_tropa(body)?;
    let message = format!("tropa {} registered", tropa.numero);
    Ok(Envelope::created(tropa, message))
}

async fn list_tropas(
    State(svc): State<AppState>,
    query: Result<Query<TropaQuery>, QueryRejection>,
) -> ApiResult<Vec<Tropa>> {
    let Query(q) = query?;
    let page = PageParams::new(q.page, q.limit);
    let filters = TropaFilters {
        titular_faena_id: q.titular_faena_id,
        numero: q.numero,
    };
    Ok(Envelope::paginated(svc.list_tropas(&page, &filters)?, &page))
}

async fn get_tropa(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Tropa> {
    let Path(id) = path?;
    Ok(Envelope::success(svc.get_tropa(id)?))
}

async fn update_tropa(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Tropa> {
    let Path(id) = path?;
    let Json(patch) = body?;
    Ok(Envelope::with_message(svc.update_tropa(id, patch)?, "tropa updated"))
}

async fn update_detalle(
    State(svc): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    body: Result<Json<CantidadDeclarada>, JsonRejection>,
) -> ApiResult<Tropa> {
    let Path((id, detalle_id)) = path?;
    let Json(body) = body?;
    Ok(Envelope::with_message(
        svc.update_tropa_detalle(id, detalle_id, body.cantidad)?,
        "declared quantity updated",
    ))
}

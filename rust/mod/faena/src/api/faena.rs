use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};

use faena_core::{ApiCreated, ApiResult, Envelope};

use crate::model::{Faena, NuevaFaena};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tropas/{id}/faenas", post(record_faena).get(list_faenas))
        .route("/faenas/{id}", get(get_faena))
}

async fn record_faena(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<NuevaFaena>, JsonRejection>,
) -> ApiCreated<Faena> {
    let Path(tropa_id) = path?;
    let Json(body) = body?;
    Ok(Envelope::created(svc.record_faena(tropa_id, body)?, "faena recorded"))
}

async fn list_faenas(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Faena>> {
    let Path(tropa_id) = path?;
    Ok(Envelope::success(svc.list_faenas(tropa_id)?))
}

async fn get_faena(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Faena> {
    let Path(id) = path?;
    Ok(Envelope::success(svc.get_faena(id)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::testing::{api, crear_tropa, seeded_router};

    #[tokio::test]
    async fn record_list_and_get() {
        let router = seeded_router();
        let tropa = crear_tropa(&router, "T-1", json!([{"especieId": 1, "categoriaId": 1, "cantidad": 10}])).await;
        let detalle = tropa["detalles"][0]["id"].clone();
        let uri = format!("/v1/tropas/{}/faenas", tropa["id"]);

        let (status, body) = api(&router, "POST", &uri, Some(json!({
            "fecha": "2026-03-03",
            "detalles": [{"tropaDetalleId": detalle, "cantidad": 4}]
        })))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "faena recorded");
        let faena = body["data"].clone();
        assert_eq!(faena["detalles"][0]["cantidad"], 4);
        assert_eq!(faena["detalles"][0]["categoria"], "Vaquillona");

        let (status, body) = api(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([faena.clone()]));

        let (status, body) = api(&router, "GET", &format!("/v1/faenas/{}", faena["id"]), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], faena);
    }

    #[tokio::test]
    async fn over_allocation_is_409_and_writes_nothing() {
        let router = seeded_router();
        let tropa = crear_tropa(&router, "T-2", json!([{"especieId": 1, "categoriaId": 2, "cantidad": 3}])).await;
        let detalle = tropa["detalles"][0]["id"].clone();
        let uri = format!("/v1/tropas/{}/faenas", tropa["id"]);

        let (status, body) = api(&router, "POST", &uri, Some(json!({
            "fecha": "2026-03-03",
            "detalles": [{"tropaDetalleId": detalle, "cantidad": 4}]
        })))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "QUANTITY_EXCEEDED");
        assert_eq!(body["details"]["exceeded"][0]["available"], 3);
        assert_eq!(body["details"]["exceeded"][0]["requested"], 4);

        let (_, body) = api(&router, "GET", &uri, None).await;
        assert_eq!(body["data"], json!([]));
        let (_, body) = api(&router, "GET", "/v1/remanente?numero=T-2", None).await;
        assert_eq!(body["data"]["especies"]["Bovino"]["TOTAL"]["remanente"], 3);
    }

    #[tokio::test]
    async fn unknown_resources_are_404() {
        let router = seeded_router();
        let (status, _) = api(&router, "GET", "/v1/faenas/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = api(&router, "POST", "/v1/tropas/77/faenas", Some(json!({
            "fecha": "2026-03-03",
            "detalles": [{"tropaDetalleId": 1, "cantidad": 1}]
        })))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

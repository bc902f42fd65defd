use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

use faena_core::{ApiResult, Envelope};

use crate::remanente::{Remanente, TropaKey};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/remanente", get(get_remanente))
}

/// `?id=<int>` or `?numero=<str>`. The id is kept as text so a malformed
/// value is reported through the error envelope.
#[derive(Deserialize)]
struct RemanenteQuery {
    id: Option<String>,
    numero: Option<String>,
}

async fn get_remanente(
    State(svc): State<AppState>,
    query: Result<Query<RemanenteQuery>, QueryRejection>,
) -> ApiResult<Remanente> {
    let Query(q) = query?;
    let key = TropaKey::parse(q.id.as_deref(), q.numero.as_deref())?;
    Ok(Envelope::success(svc.remanente(&key)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::testing::{api, crear_tropa, seeded_router};

    #[tokio::test]
    async fn remanente_envelope() {
        let router = seeded_router();
        let tropa = crear_tropa(&router, "T-100", json!([
            {"especieId": 1, "categoriaId": 1, "cantidad": 50},
            {"especieId": 1, "categoriaId": 2, "cantidad": 30},
        ]))
        .await;
        let novillo = tropa["detalles"][1]["id"].clone();
        let vaquillona = tropa["detalles"][0]["id"].clone();
        let uri = format!("/v1/tropas/{}/faenas", tropa["id"]);
        let (status, _) = api(&router, "POST", &uri, Some(json!({
            "fecha": "2026-03-03",
            "detalles": [{"tropaDetalleId": vaquillona, "cantidad": 20}]
        })))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = api(&router, "POST", &uri, Some(json!({
            "fecha": "2026-03-04",
            "detalles": [
                {"tropaDetalleId": vaquillona, "cantidad": 10},
                {"tropaDetalleId": novillo, "cantidad": 5},
            ]
        })))
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = api(&router, "GET", "/v1/remanente?numero=T-100", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["timestamp"].is_string());
        assert_eq!(body["data"]["numero"], "T-100");
        assert_eq!(body["data"]["fecha"], "2026-03-02");
        assert_eq!(
            body["data"]["especies"],
            json!({
                "Bovino": {
                    "Vaquillona": {"faenados": 30, "remanente": 20},
                    "Novillo": {"faenados": 5, "remanente": 25},
                    "TOTAL": {"faenados": 35, "remanente": 45},
                }
            })
        );

        let (status, by_id) = api(&router, "GET", &format!("/v1/remanente?id={}", tropa["id"]), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_id["data"], body["data"]);
    }

    #[tokio::test]
    async fn unknown_tropa_is_404() {
        let router = seeded_router();
        let (status, body) = api(&router, "GET", "/v1/remanente?numero=T-999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body["message"].as_str().unwrap().contains("T-999"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn malformed_identifier_is_400() {
        let router = seeded_router();
        for uri in [
            "/v1/remanente",
            "/v1/remanente?id=abc",
            "/v1/remanente?id=-3",
            "/v1/remanente?numero=",
            "/v1/remanente?id=1&numero=T-1",
        ] {
            let (status, body) = api(&router, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], "VALIDATION_ERROR", "{uri}");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn empty_tropa_has_empty_especies() {
        let router = seeded_router();
        crear_tropa(&router, "T-0", json!([])).await;
        let (status, body) = api(&router, "GET", "/v1/remanente?numero=T-0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["especies"], json!({}));
    }
}

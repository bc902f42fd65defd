use axum::{extract::State, routing::get, Router};

use faena_core::{ApiResult, Envelope};

use crate::model::{Enfermedad, Especie, TipoParte, TitularFaena};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/especies", get(list_especies))
        .route("/enfermedades", get(list_enfermedades))
        .route("/tipos-parte", get(list_tipos_parte))
        .route("/titulares", get(list_titulares))
}

async fn list_especies(State(svc): State<AppState>) -> ApiResult<Vec<Especie>> {
    Ok(Envelope::success(svc.list_especies()?))
}

async fn list_enfermedades(State(svc): State<AppState>) -> ApiResult<Vec<Enfermedad>> {
    Ok(Envelope::success(svc.list_enfermedades()?))
}

async fn list_tipos_parte(State(svc): State<AppState>) -> ApiResult<Vec<TipoParte>> {
    Ok(Envelope::success(svc.list_tipos_parte()?))
}

async fn list_titulares(State(svc): State<AppState>) -> ApiResult<Vec<TitularFaena>> {
    Ok(Envelope::success(svc.list_titulares()?))
}

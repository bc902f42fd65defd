pub mod catalog;
pub mod decomiso;
pub mod faena;
pub mod remanente;
pub mod tropa;

use std::sync::Arc;

use axum::Router;

use crate::service::FaenaService;

/// Shared application state.
pub type AppState = Arc<FaenaService>;

/// Build the faena API router. Mounted by the server under `/faena`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(remanente::routes())
        .merge(tropa::routes())
        .merge(faena::routes())
        .merge(decomiso::routes())
        .merge(catalog::routes())
}

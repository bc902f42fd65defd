pub mod api;
pub mod model;
pub mod remanente;
pub mod service;

use std::sync::Arc;

use axum::Router;
use faena_core::Module;

use service::FaenaService;

/// Faena module: herd registration, slaughter, seizures and remanente.
pub struct FaenaModule {
    service: Arc<FaenaService>,
}

impl FaenaModule {
    pub fn new(service: Arc<FaenaService>) -> Self {
        Self { service }
    }
}

impl Module for FaenaModule {
    fn name(&self) -> &str {
        "faena"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}

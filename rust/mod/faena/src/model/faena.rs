use serde::{Deserialize, Serialize};

/// Faena: a slaughter event recorded against a herd. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Faena {
    pub id: i64,
    pub tropa_id: i64,
    /// Slaughter date, `YYYY-MM-DD`.
    pub fecha: String,
    pub detalles: Vec<FaenaDetalle>,
    pub created_at: String,
}

/// Slaughtered quantity for one herd detail row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaenaDetalle {
    pub id: i64,
    pub tropa_detalle_id: i64,
    pub especie: String,
    pub categoria: String,
    pub cantidad: u64,
}

/// Body of `POST /tropas/{id}/faenas`.
#[derive(Debug, Clone, Deserialize)]
pub struct NuevaFaena {
    pub fecha: String,
    pub detalles: Vec<CantidadFaenada>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CantidadFaenada {
    pub tropa_detalle_id: i64,
    pub cantidad: i64,
}

use serde::{Deserialize, Serialize};

/// Decomiso: organs or parts seized during a slaughter event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Decomiso {
    pub id: i64,
    pub faena_id: i64,
    pub enfermedad_id: i64,
    pub enfermedad: String,
    pub tipo_parte_id: i64,
    pub tipo_parte: String,
    pub cantidad: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    pub created_at: String,
}

/// Body of `POST /faenas/{id}/decomisos`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevoDecomiso {
    pub enfermedad_id: i64,
    pub tipo_parte_id: i64,
    pub cantidad: i64,
    #[serde(default)]
    pub observaciones: Option<String>,
}

/// Seizure totals of one slaughter event, grouped by disease and part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResumenDecomisos {
    pub faena_id: i64,
    pub lineas: Vec<LineaResumen>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineaResumen {
    pub enfermedad: String,
    pub tipo_parte: String,
    pub cantidad: u64,
}

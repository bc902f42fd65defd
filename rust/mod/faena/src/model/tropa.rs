use serde::{Deserialize, Serialize};

/// Tropa: a registered herd declared for slaughter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tropa {
    #[serde(default)]
    pub id: i64,

    /// Herd number (e.g. "T-100"), unique per herd.
    pub numero: String,

    /// Issuing authority of the transit documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emisor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localidad: Option<String>,

    /// Transit document number (DT-e).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dte: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guia_policial: Option<String>,

    /// Reference date, `YYYY-MM-DD`.
    pub fecha: String,

    pub titular_faena_id: i64,

    /// Declared head counts, one per (species, category).
    #[serde(default)]
    pub detalles: Vec<TropaDetalle>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,
}

/// Declared quantity for one species/category within a herd.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TropaDetalle {
    pub id: i64,
    pub tropa_id: i64,
    pub especie_id: i64,
    pub especie: String,
    pub categoria_id: i64,
    pub categoria: String,
    pub cantidad: u64,
}

/// Body of `POST /tropas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevaTropa {
    pub numero: String,
    #[serde(default)]
    pub emisor: Option<String>,
    #[serde(default)]
    pub localidad: Option<String>,
    #[serde(default)]
    pub dte: Option<String>,
    #[serde(default)]
    pub guia_policial: Option<String>,
    pub fecha: String,
    pub titular_faena_id: i64,
    #[serde(default)]
    pub detalles: Vec<NuevoDetalle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevoDetalle {
    pub especie_id: i64,
    pub categoria_id: i64,
    pub cantidad: i64,
}

/// Body of `PATCH /tropas/{id}/detalles/{detalle_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CantidadDeclarada {
    pub cantidad: i64,
}

/// Filters for `GET /tropas`.
#[derive(Debug, Clone, Default)]
pub struct TropaFilters {
    pub titular_faena_id: Option<i64>,
    pub numero: Option<String>,
}

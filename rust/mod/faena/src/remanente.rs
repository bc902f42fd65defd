//! Remanente reconciliation.
//!
//! Given the declared head counts of a herd and the slaughtered totals
//! recorded against it, compute per species and category how many animals
//! were slaughtered and how many remain:
//!
//! ```text
//! remanente(categoria) = max(declarado - faenado, 0)
//! TOTAL.faenados       = Σ faenado
//! TOTAL.remanente      = Σ remanente
//! ```
//!
//! The result is never stored; it is recomputed from the two append-only
//! tables on every request. Species and categories keep the order in which
//! they were first declared, so identical inputs serialize identically.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use faena_core::ServiceError;

/// How the caller identifies a herd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TropaKey {
    /// Numeric row id.
    Id(i64),
    /// Human-readable herd number, e.g. `"T-100"`.
    Numero(String),
}

impl TropaKey {
    /// Build a key from the `id` / `numero` query parameters. Exactly one
    /// must be present; `id` must be a positive integer.
    pub fn parse(id: Option<&str>, numero: Option<&str>) -> Result<Self, ServiceError> {
        match (id.map(str::trim), numero.map(str::trim)) {
            (Some(id), None) => match id.parse::<i64>() {
                Ok(n) if n > 0 => Ok(TropaKey::Id(n)),
                _ => Err(ServiceError::Validation(format!(
                    "invalid tropa id '{id}': expected a positive integer"
                ))),
            },
            (None, Some(numero)) if !numero.is_empty() => Ok(TropaKey::Numero(numero.to_string())),
            (None, Some(_)) => Err(ServiceError::Validation("tropa numero must not be empty".into())),
            (Some(_), Some(_)) => Err(ServiceError::Validation(
                "give either 'id' or 'numero', not both".into(),
            )),
            (None, None) => Err(ServiceError::Validation(
                "missing tropa identifier: 'id' or 'numero' is required".into(),
            )),
        }
    }
}

impl std::fmt::Display for TropaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TropaKey::Id(id) => write!(f, "id {id}"),
            TropaKey::Numero(n) => write!(f, "'{n}'"),
        }
    }
}

/// Declared quantity for one (species, category) of a herd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarado {
    pub especie: String,
    pub categoria: String,
    pub cantidad: u64,
}

/// Cumulative slaughtered quantity for one (species, category) of a herd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faenado {
    pub especie: String,
    pub categoria: String,
    pub cantidad: u64,
}

/// Slaughtered and remaining head count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Conteo {
    pub faenados: u64,
    pub remanente: u64,
}

/// Categories of one species plus its `TOTAL` row.
///
/// Serializes as a flat map: `{"Vaquillona": {...}, "Novillo": {...}, "TOTAL": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemanenteEspecie {
    #[serde(flatten)]
    pub categorias: IndexMap<String, Conteo>,
    #[serde(rename = "TOTAL")]
    pub total: Conteo,
}

/// A category whose slaughtered total exceeds its declared quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sobrefaena {
    pub especie: String,
    pub categoria: String,
    pub declarado: u64,
    pub faenado: u64,
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliacion {
    pub especies: IndexMap<String, RemanenteEspecie>,
    /// Categories that were clamped to zero.
    pub sobrefaenas: Vec<Sobrefaena>,
}

/// Remanente report of one herd, as returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remanente {
    pub tropa_id: i64,
    pub numero: String,
    pub fecha: String,
    pub especies: IndexMap<String, RemanenteEspecie>,
}

/// Reconcile declared against slaughtered quantities.
///
/// Only (species, category) pairs present in `declarados` appear in the
/// output; slaughtered totals for undeclared pairs are ignored. Repeated
/// declarations of the same pair are summed.
pub fn reconcile(declarados: &[Declarado], faenados: &[Faenado]) -> Reconciliacion {
    let mut faenado_por_par: HashMap<(&str, &str), u64> = HashMap::new();
    for f in faenados {
        *faenado_por_par
            .entry((f.especie.as_str(), f.categoria.as_str()))
            .or_default() += f.cantidad;
    }

    // Declared totals per pair, in first-declaration order.
    let mut declarado_por_par: IndexMap<(&str, &str), u64> = IndexMap::new();
    for d in declarados {
        *declarado_por_par
            .entry((d.especie.as_str(), d.categoria.as_str()))
            .or_default() += d.cantidad;
    }

    let mut out = Reconciliacion::default();
    for ((especie, categoria), declarado) in declarado_por_par {
        let faenado = faenado_por_par.get(&(especie, categoria)).copied().unwrap_or(0);
        if faenado > declarado {
            out.sobrefaenas.push(Sobrefaena {
                especie: especie.to_string(),
                categoria: categoria.to_string(),
                declarado,
                faenado,
            });
        }
        let conteo = Conteo {
            faenados: faenado,
            remanente: declarado.saturating_sub(faenado),
        };

        let grupo = out.especies.entry(especie.to_string()).or_default();
        grupo.total.faenados += conteo.faenados;
        grupo.total.remanente += conteo.remanente;
        grupo.categorias.insert(categoria.to_string(), conteo);
    }
    out
}

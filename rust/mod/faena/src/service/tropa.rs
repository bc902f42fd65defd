use std::collections::HashSet;

use serde_json::json;
use tracing::info;

use faena_core::{merge_patch, now_rfc3339, ListResult, PageParams, ServiceError};
use faena_sql::{SQLError, SQLExec, Value};

use crate::model::{NuevaTropa, Tropa, TropaDetalle, TropaFilters};
use super::catalog::{check_categoria, check_titular};
use super::{
    clean, col_cantidad, col_i64, col_opt_str, col_str, count_of, parse_fecha, storage,
    FaenaService,
};

/// Fields a header patch may not touch.
const IMMUTABLE_FIELDS: &[&str] = &["id", "detalles", "createdAt", "updatedAt"];

impl FaenaService {
    /// Register a herd with its declared head counts.
    pub fn create_tropa(&self, input: NuevaTropa) -> Result<Tropa, ServiceError> {
        let numero = input.numero.trim().to_string();
        if numero.is_empty() {
            return Err(ServiceError::Validation("numero must not be empty".into()));
        }
        let fecha = parse_fecha(&input.fecha)?;

        let mut pares = HashSet::new();
        for (i, d) in input.detalles.iter().enumerate() {
            if d.cantidad < 0 {
                return Err(ServiceError::Validation(format!(
                    "detalles[{i}]: cantidad must be >= 0, got {}",
                    d.cantidad
                )));
            }
            if !pares.insert((d.especie_id, d.categoria_id)) {
                return Err(ServiceError::Validation(format!(
                    "detalles[{i}]: especie {} / categoria {} declared twice",
                    d.especie_id, d.categoria_id
                )));
            }
        }

        let now = now_rfc3339();
        let tropa = self.in_tx(|tx| {
            check_titular(tx, input.titular_faena_id)?;
            for d in &input.detalles {
                check_categoria(tx, d.especie_id, d.categoria_id)?;
            }
            if numero_taken(tx, &numero, None)? {
                return Err(ServiceError::Conflict(format!("tropa '{numero}' already exists")));
            }

            let rows = tx
                .query(
                    "INSERT INTO tropas (numero, emisor, localidad, dte, guia_policial, fecha, \
                     titular_faena_id, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) RETURNING id",
                    &[
                        numero.as_str().into(),
                        clean(input.emisor.clone()).into(),
                        clean(input.localidad.clone()).into(),
                        clean(input.dte.clone()).into(),
                        clean(input.guia_policial.clone()).into(),
                        fecha.as_str().into(),
                        input.titular_faena_id.into(),
                        now.as_str().into(),
                    ],
                )
                .map_err(|e| conflict_or_storage(e, &numero))?;
            let id = rows
                .first()
                .map(|r| col_i64(r, "id"))
                .transpose()?
                .ok_or_else(|| ServiceError::Internal("insert returned no id".into()))?;

            for d in &input.detalles {
                tx.exec(
                    "INSERT INTO tropa_detalles (tropa_id, especie_id, categoria_id, cantidad) \
                     VALUES (?1, ?2, ?3, ?4)",
                    &[id.into(), d.especie_id.into(), d.categoria_id.into(), d.cantidad.into()],
                )
                .map_err(storage)?;
            }

            load_tropa(tx, id)?
                .ok_or_else(|| ServiceError::Internal(format!("tropa {id} vanished after insert")))
        })?;

        info!(id = tropa.id, numero = %tropa.numero, detalles = tropa.detalles.len(), "tropa created");
        Ok(tropa)
    }

    pub fn get_tropa(&self, id: i64) -> Result<Tropa, ServiceError> {
        load_tropa(self.sql.as_ref(), id)?
            .ok_or_else(|| ServiceError::NotFound(format!("tropa {id} not found")))
    }

    /// Herds newest first, optionally filtered by licence holder or by a
    /// fragment of the herd number.
    pub fn list_tropas(
        &self,
        page: &PageParams,
        filters: &TropaFilters,
    ) -> Result<ListResult<Tropa>, ServiceError> {
        let offset = page.offset()?;
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(titular) = filters.titular_faena_id {
            params.push(titular.into());
            clauses.push("titular_faena_id = ?");
        }
        if let Some(numero) = filters.numero.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            params.push(like_fragment(numero).into());
            clauses.push("numero LIKE '%' || ? || '%' ESCAPE '\\'");
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let db = self.sql.as_ref();
        let total = count_of(
            &db.query(&format!("SELECT COUNT(*) AS cnt FROM tropas{where_sql}"), &params)
                .map_err(storage)?,
        );

        let mut page_params = params.clone();
        page_params.push((page.limit as i64).into());
        page_params.push(offset.into());
        let rows = db
            .query(
                &format!(
                    "SELECT {HEADER_COLUMNS} FROM tropas{where_sql} \
                     ORDER BY fecha DESC, id DESC LIMIT ? OFFSET ?"
                ),
                &page_params,
            )
            .map_err(storage)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut tropa = tropa_from_row(row)?;
            tropa.detalles = load_detalles(db, tropa.id)?;
            items.push(tropa);
        }
        Ok(ListResult { items, total })
    }

    /// Apply a JSON merge patch to the herd header.
    pub fn update_tropa(&self, id: i64, patch: serde_json::Value) -> Result<Tropa, ServiceError> {
        let mut patch = patch;
        let Some(obj) = patch.as_object_mut() else {
            return Err(ServiceError::Validation("patch must be a JSON object".into()));
        };
        for field in IMMUTABLE_FIELDS {
            obj.remove(*field);
        }

        let tropa = self.in_tx(|tx| {
            let current = load_tropa(tx, id)?
                .ok_or_else(|| ServiceError::NotFound(format!("tropa {id} not found")))?;

            let mut merged = serde_json::to_value(&current)
                .map_err(|e| ServiceError::Internal(format!("serialize tropa: {e}")))?;
            merge_patch(&mut merged, &patch);
            let updated: Tropa = serde_json::from_value(merged)
                .map_err(|e| ServiceError::Validation(format!("invalid patch: {e}")))?;

            let numero = updated.numero.trim().to_string();
            if numero.is_empty() {
                return Err(ServiceError::Validation("numero must not be empty".into()));
            }
            let fecha = parse_fecha(&updated.fecha)?;
            if updated.titular_faena_id != current.titular_faena_id {
                check_titular(tx, updated.titular_faena_id)?;
            }
            if numero_taken(tx, &numero, Some(id))? {
                return Err(ServiceError::Conflict(format!("tropa '{numero}' already exists")));
            }

            tx.exec(
                "UPDATE tropas SET numero = ?1, emisor = ?2, localidad = ?3, dte = ?4, \
                 guia_policial = ?5, fecha = ?6, titular_faena_id = ?7, updated_at = ?8 \
                 WHERE id = ?9",
                &[
                    numero.as_str().into(),
                    clean(updated.emisor).into(),
                    clean(updated.localidad).into(),
                    clean(updated.dte).into(),
                    clean(updated.guia_policial).into(),
                    fecha.into(),
                    updated.titular_faena_id.into(),
                    now_rfc3339().into(),
                    id.into(),
                ],
            )
            .map_err(|e| conflict_or_storage(e, &numero))?;

            load_tropa(tx, id)?.ok_or_else(|| ServiceError::Internal(format!("tropa {id} vanished")))
        })?;

        info!(id, "tropa updated");
        Ok(tropa)
    }

    /// Change the declared quantity of one detail row. The new quantity may
    /// not fall below what has already been slaughtered from that row.
    pub fn update_tropa_detalle(
        &self,
        tropa_id: i64,
        detalle_id: i64,
        cantidad: i64,
    ) -> Result<Tropa, ServiceError> {
        if cantidad < 0 {
            return Err(ServiceError::Validation(format!(
                "cantidad must be >= 0, got {cantidad}"
            )));
        }

        let tropa = self.in_tx(|tx| {
            let rows = tx
                .query(
                    "SELECT td.cantidad, \
                            (SELECT COALESCE(SUM(fd.cantidad), 0) FROM faena_detalles fd \
                              WHERE fd.tropa_detalle_id = td.id) AS faenado \
                     FROM tropa_detalles td WHERE td.id = ?1 AND td.tropa_id = ?2",
                    &[detalle_id.into(), tropa_id.into()],
                )
                .map_err(storage)?;
            let row = rows.first().ok_or_else(|| {
                ServiceError::NotFound(format!("detalle {detalle_id} of tropa {tropa_id} not found"))
            })?;
            let faenado = col_cantidad(row, "faenado")?;
            if (cantidad as u64) < faenado {
                return Err(ServiceError::QuantityExceeded {
                    message: format!(
                        "detalle {detalle_id}: {faenado} head already slaughtered, cannot declare {cantidad}"
                    ),
                    details: json!({
                        "tropaDetalleId": detalle_id,
                        "requested": cantidad,
                        "slaughtered": faenado,
                    }),
                });
            }

            tx.exec(
                "UPDATE tropa_detalles SET cantidad = ?1 WHERE id = ?2",
                &[cantidad.into(), detalle_id.into()],
            )
            .map_err(storage)?;
            tx.exec(
                "UPDATE tropas SET updated_at = ?1 WHERE id = ?2",
                &[now_rfc3339().into(), tropa_id.into()],
            )
            .map_err(storage)?;

            load_tropa(tx, tropa_id)?
                .ok_or_else(|| ServiceError::Internal(format!("tropa {tropa_id} vanished")))
        })?;

        info!(tropa_id, detalle_id, cantidad, "declared quantity updated");
        Ok(tropa)
    }
}

// ── Loaders ──

const HEADER_COLUMNS: &str = "id, numero, emisor, localidad, dte, guia_policial, fecha, \
                              titular_faena_id, created_at, updated_at";

pub(crate) fn load_tropa<E: SQLExec + ?Sized>(db: &E, id: i64) -> Result<Option<Tropa>, ServiceError> {
    let rows = db
        .query(&format!("SELECT {HEADER_COLUMNS} FROM tropas WHERE id = ?1"), &[id.into()])
        .map_err(storage)?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    let mut tropa = tropa_from_row(row)?;
    tropa.detalles = load_detalles(db, id)?;
    Ok(Some(tropa))
}

/// Declared rows of a herd, in declaration order.
pub(crate) fn load_detalles<E: SQLExec + ?Sized>(
    db: &E,
    tropa_id: i64,
) -> Result<Vec<TropaDetalle>, ServiceError> {
    let rows = db
        .query(
            "SELECT td.id, td.tropa_id, td.especie_id, e.nombre AS especie, \
                    td.categoria_id, c.nombre AS categoria, td.cantidad \
             FROM tropa_detalles td \
             JOIN especies e ON e.id = td.especie_id \
             JOIN categorias_especie c ON c.id = td.categoria_id \
             WHERE td.tropa_id = ?1 ORDER BY td.id",
            &[tropa_id.into()],
        )
        .map_err(storage)?;
    rows.iter()
        .map(|r| {
            Ok(TropaDetalle {
                id: col_i64(r, "id")?,
                tropa_id: col_i64(r, "tropa_id")?,
                especie_id: col_i64(r, "especie_id")?,
                especie: col_str(r, "especie")?,
                categoria_id: col_i64(r, "categoria_id")?,
                categoria: col_str(r, "categoria")?,
                cantidad: col_cantidad(r, "cantidad")?,
            })
        })
        .collect()
}

fn tropa_from_row(row: &faena_sql::Row) -> Result<Tropa, ServiceError> {
    Ok(Tropa {
        id: col_i64(row, "id")?,
        numero: col_str(row, "numero")?,
        emisor: col_opt_str(row, "emisor"),
        localidad: col_opt_str(row, "localidad"),
        dte: col_opt_str(row, "dte"),
        guia_policial: col_opt_str(row, "guia_policial"),
        fecha: col_str(row, "fecha")?,
        titular_faena_id: col_i64(row, "titular_faena_id")?,
        detalles: Vec::new(),
        created_at: col_str(row, "created_at")?,
        updated_at: col_str(row, "updated_at")?,
    })
}

fn numero_taken<E: SQLExec + ?Sized>(
    db: &E,
    numero: &str,
    except: Option<i64>,
) -> Result<bool, ServiceError> {
    super::exists(
        db,
        "SELECT 1 FROM tropas WHERE numero = ?1 AND id != ?2",
        &[numero.into(), except.unwrap_or(0).into()],
    )
}

/// Escape LIKE wildcards so a numero fragment matches literally.
fn like_fragment(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn conflict_or_storage(e: SQLError, numero: &str) -> ServiceError {
    if e.is_unique_violation() {
        ServiceError::Conflict(format!("tropa '{numero}' already exists"))
    } else {
        storage(e)
    }
}

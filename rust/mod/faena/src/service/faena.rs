use indexmap::IndexMap;
use serde_json::json;
use tracing::info;

use faena_core::{now_rfc3339, ServiceError};
use faena_sql::SQLExec;

use crate::model::{Faena, FaenaDetalle, NuevaFaena};
use super::{col_cantidad, col_i64, col_str, exists, parse_fecha, storage, FaenaService};

impl FaenaService {
    /// Record a slaughter event against a herd.
    ///
    /// Every referenced detail row is checked against its current remanente
    /// inside the same transaction that writes the event, so a request either
    /// fits entirely or writes nothing.
    pub fn record_faena(&self, tropa_id: i64, input: NuevaFaena) -> Result<Faena, ServiceError> {
        let fecha = parse_fecha(&input.fecha)?;
        if input.detalles.is_empty() {
            return Err(ServiceError::Validation("a faena needs at least one detalle".into()));
        }

        // Requested head count per detail row; repeated rows are summed.
        let mut pedido: IndexMap<i64, u64> = IndexMap::new();
        for (i, d) in input.detalles.iter().enumerate() {
            if d.cantidad <= 0 {
                return Err(ServiceError::Validation(format!(
                    "detalles[{i}]: cantidad must be > 0, got {}",
                    d.cantidad
                )));
            }
            let total = pedido.entry(d.tropa_detalle_id).or_default();
            *total = total.checked_add(d.cantidad as u64).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "detalles[{i}]: total cantidad for tropa detalle {} is out of range",
                    d.tropa_detalle_id
                ))
            })?;
        }

        let faena = self.in_tx(|tx| {
            if !exists(tx, "SELECT 1 FROM tropas WHERE id = ?1", &[tropa_id.into()])? {
                return Err(ServiceError::NotFound(format!("tropa {tropa_id} not found")));
            }

            let mut excedidos = Vec::new();
            for (&detalle_id, &requested) in &pedido {
                let rows = tx
                    .query(
                        "SELECT td.tropa_id, td.cantidad, \
                                (SELECT COALESCE(SUM(fd.cantidad), 0) FROM faena_detalles fd \
                                  WHERE fd.tropa_detalle_id = td.id) AS faenado \
                         FROM tropa_detalles td WHERE td.id = ?1",
                        &[detalle_id.into()],
                    )
                    .map_err(storage)?;
                let Some(row) = rows.first() else {
                    return Err(ServiceError::Validation(format!(
                        "tropa detalle {detalle_id} does not exist"
                    )));
                };
                if col_i64(row, "tropa_id")? != tropa_id {
                    return Err(ServiceError::Validation(format!(
                        "tropa detalle {detalle_id} does not belong to tropa {tropa_id}"
                    )));
                }
                let available = col_cantidad(row, "cantidad")?
                    .saturating_sub(col_cantidad(row, "faenado")?);
                if requested > available {
                    excedidos.push(json!({
                        "tropaDetalleId": detalle_id,
                        "requested": requested,
                        "available": available,
                    }));
                }
            }
            if !excedidos.is_empty() {
                return Err(ServiceError::QuantityExceeded {
                    message: format!(
                        "requested quantity exceeds the remaining head count for {} detalle(s)",
                        excedidos.len()
                    ),
                    details: json!({ "exceeded": excedidos }),
                });
            }

            let rows = tx
                .query(
                    "INSERT INTO faenas (tropa_id, fecha, created_at) VALUES (?1, ?2, ?3) RETURNING id",
                    &[tropa_id.into(), fecha.as_str().into(), now_rfc3339().into()],
                )
                .map_err(storage)?;
            let id = rows
                .first()
                .map(|r| col_i64(r, "id"))
                .transpose()?
                .ok_or_else(|| ServiceError::Internal("insert returned no id".into()))?;

            for (&detalle_id, &cantidad) in &pedido {
                tx.exec(
                    "INSERT INTO faena_detalles (faena_id, tropa_detalle_id, cantidad) VALUES (?1, ?2, ?3)",
                    &[id.into(), detalle_id.into(), (cantidad as i64).into()],
                )
                .map_err(storage)?;
            }

            load_faena(tx, id)?
                .ok_or_else(|| ServiceError::Internal(format!("faena {id} vanished after insert")))
        })?;

        info!(id = faena.id, tropa_id, detalles = faena.detalles.len(), "faena recorded");
        Ok(faena)
    }

    pub fn get_faena(&self, id: i64) -> Result<Faena, ServiceError> {
        load_faena(self.sql.as_ref(), id)?
            .ok_or_else(|| ServiceError::NotFound(format!("faena {id} not found")))
    }

    /// Slaughter events of a herd, by date and then by id.
    pub fn list_faenas(&self, tropa_id: i64) -> Result<Vec<Faena>, ServiceError> {
        let db = self.sql.as_ref();
        if !exists(db, "SELECT 1 FROM tropas WHERE id = ?1", &[tropa_id.into()])? {
            return Err(ServiceError::NotFound(format!("tropa {tropa_id} not found")));
        }
        let rows = db
            .query(
                "SELECT id, tropa_id, fecha, created_at FROM faenas \
                 WHERE tropa_id = ?1 ORDER BY fecha, id",
                &[tropa_id.into()],
            )
            .map_err(storage)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = col_i64(row, "id")?;
            out.push(Faena {
                id,
                tropa_id: col_i64(row, "tropa_id")?,
                fecha: col_str(row, "fecha")?,
                detalles: load_detalles(db, id)?,
                created_at: col_str(row, "created_at")?,
            });
        }
        Ok(out)
    }
}

pub(crate) fn load_faena<E: SQLExec + ?Sized>(db: &E, id: i64) -> Result<Option<Faena>, ServiceError> {
    let rows = db
        .query(
            "SELECT id, tropa_id, fecha, created_at FROM faenas WHERE id = ?1",
            &[id.into()],
        )
        .map_err(storage)?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    Ok(Some(Faena {
        id,
        tropa_id: col_i64(row, "tropa_id")?,
        fecha: col_str(row, "fecha")?,
        detalles: load_detalles(db, id)?,
        created_at: col_str(row, "created_at")?,
    }))
}

fn load_detalles<E: SQLExec + ?Sized>(db: &E, faena_id: i64) -> Result<Vec<FaenaDetalle>, ServiceError> {
    let rows = db
        .query(
            "SELECT fd.id, fd.tropa_detalle_id, e.nombre AS especie, c.nombre AS categoria, fd.cantidad \
             FROM faena_detalles fd \
             JOIN tropa_detalles td ON td.id = fd.tropa_detalle_id \
             JOIN especies e ON e.id = td.especie_id \
             JOIN categorias_especie c ON c.id = td.categoria_id \
             WHERE fd.faena_id = ?1 ORDER BY fd.id",
            &[faena_id.into()],
        )
        .map_err(storage)?;
    rows.iter()
        .map(|r| {
            Ok(FaenaDetalle {
                id: col_i64(r, "id")?,
                tropa_detalle_id: col_i64(r, "tropa_detalle_id")?,
                especie: col_str(r, "especie")?,
                categoria: col_str(r, "categoria")?,
                cantidad: col_cantidad(r, "cantidad")?,
            })
        })
        .collect()
}

use tracing::info;

use faena_core::{now_rfc3339, ServiceError};
use faena_sql::SQLExec;

use crate::model::{Decomiso, LineaResumen, NuevoDecomiso, ResumenDecomisos};
use super::catalog::{check_enfermedad, check_tipo_parte};
use super::{clean, col_cantidad, col_i64, col_opt_str, col_str, exists, storage, FaenaService};

const DECOMISO_SELECT: &str = "SELECT d.id, d.faena_id, d.enfermedad_id, en.nombre AS enfermedad, \
                                      d.tipo_parte_id, tp.nombre AS tipo_parte, d.cantidad, \
                                      d.observaciones, d.created_at \
                               FROM decomisos d \
                               JOIN enfermedades en ON en.id = d.enfermedad_id \
                               JOIN tipos_parte tp ON tp.id = d.tipo_parte_id";

impl FaenaService {
    /// Record organs or parts seized during a slaughter event.
    pub fn record_decomiso(
        &self,
        faena_id: i64,
        input: NuevoDecomiso,
    ) -> Result<Decomiso, ServiceError> {
        if input.cantidad <= 0 {
            return Err(ServiceError::Validation(format!(
                "cantidad must be > 0, got {}",
                input.cantidad
            )));
        }

        let decomiso = self.in_tx(|tx| {
            ensure_faena(tx, faena_id)?;
            check_enfermedad(tx, input.enfermedad_id)?;
            check_tipo_parte(tx, input.tipo_parte_id)?;

            let rows = tx
                .query(
                    "INSERT INTO decomisos (faena_id, enfermedad_id, tipo_parte_id, cantidad, \
                     observaciones, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
                    &[
                        faena_id.into(),
                        input.enfermedad_id.into(),
                        input.tipo_parte_id.into(),
                        input.cantidad.into(),
                        clean(input.observaciones.clone()).into(),
                        now_rfc3339().into(),
                    ],
                )
                .map_err(storage)?;
            let id = rows
                .first()
                .map(|r| col_i64(r, "id"))
                .transpose()?
                .ok_or_else(|| ServiceError::Internal("insert returned no id".into()))?;

            let rows = tx
                .query(&format!("{DECOMISO_SELECT} WHERE d.id = ?1"), &[id.into()])
                .map_err(storage)?;
            rows.first()
                .map(decomiso_from_row)
                .transpose()?
                .ok_or_else(|| ServiceError::Internal(format!("decomiso {id} vanished after insert")))
        })?;

        info!(
            id = decomiso.id,
            faena_id,
            enfermedad = %decomiso.enfermedad,
            cantidad = decomiso.cantidad,
            "decomiso recorded"
        );
        Ok(decomiso)
    }

    pub fn list_decomisos(&self, faena_id: i64) -> Result<Vec<Decomiso>, ServiceError> {
        let db = self.sql.as_ref();
        ensure_faena(db, faena_id)?;
        let rows = db
            .query(
                &format!("{DECOMISO_SELECT} WHERE d.faena_id = ?1 ORDER BY d.id"),
                &[faena_id.into()],
            )
            .map_err(storage)?;
        rows.iter().map(decomiso_from_row).collect()
    }

    /// Seized quantities of a slaughter event grouped by disease and part,
    /// plus the overall total.
    pub fn resumen_decomisos(&self, faena_id: i64) -> Result<ResumenDecomisos, ServiceError> {
        let db = self.sql.as_ref();
        ensure_faena(db, faena_id)?;
        let rows = db
            .query(
                "SELECT en.nombre AS enfermedad, tp.nombre AS tipo_parte, SUM(d.cantidad) AS cantidad \
                 FROM decomisos d \
                 JOIN enfermedades en ON en.id = d.enfermedad_id \
                 JOIN tipos_parte tp ON tp.id = d.tipo_parte_id \
                 WHERE d.faena_id = ?1 \
                 GROUP BY d.enfermedad_id, d.tipo_parte_id \
                 ORDER BY d.enfermedad_id, d.tipo_parte_id",
                &[faena_id.into()],
            )
            .map_err(storage)?;

        let mut lineas = Vec::with_capacity(rows.len());
        for row in &rows {
            lineas.push(LineaResumen {
                enfermedad: col_str(row, "enfermedad")?,
                tipo_parte: col_str(row, "tipo_parte")?,
                cantidad: col_cantidad(row, "cantidad")?,
            });
        }
        let total = lineas.iter().map(|l| l.cantidad).sum();
        Ok(ResumenDecomisos {
            faena_id,
            lineas,
            total,
        })
    }
}

fn ensure_faena<E: SQLExec + ?Sized>(db: &E, faena_id: i64) -> Result<(), ServiceError> {
    if exists(db, "SELECT 1 FROM faenas WHERE id = ?1", &[faena_id.into()])? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("faena {faena_id} not found")))
    }
}

fn decomiso_from_row(row: &faena_sql::Row) -> Result<Decomiso, ServiceError> {
    Ok(Decomiso {
        id: col_i64(row, "id")?,
        faena_id: col_i64(row, "faena_id")?,
        enfermedad_id: col_i64(row, "enfermedad_id")?,
        enfermedad: col_str(row, "enfermedad")?,
        tipo_parte_id: col_i64(row, "tipo_parte_id")?,
        tipo_parte: col_str(row, "tipo_parte")?,
        cantidad: col_cantidad(row, "cantidad")?,
        observaciones: col_opt_str(row, "observaciones"),
        created_at: col_str(row, "created_at")?,
    })
}

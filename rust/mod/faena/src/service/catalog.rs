use tracing::info;

use faena_core::ServiceError;
use faena_sql::{SQLExec, Value};

use crate::model::{CatalogSeed, CategoriaEspecie, Enfermedad, Especie, TipoParte, TitularFaena};
use super::{col_i64, col_opt_str, col_str, exists, storage, FaenaService};

impl FaenaService {
    /// Insert the configured reference data. Names already present are left
    /// untouched, so seeding the same catalog twice is a no-op.
    pub fn seed_catalog(&self, seed: &CatalogSeed) -> Result<(), ServiceError> {
        seed.validate().map_err(ServiceError::Validation)?;

        self.in_tx(|tx| {
            for especie in &seed.especies {
                let nombre = especie.nombre.trim();
                tx.exec("INSERT OR IGNORE INTO especies (nombre) VALUES (?1)", &[nombre.into()])
                    .map_err(storage)?;
                let rows = tx
                    .query("SELECT id FROM especies WHERE nombre = ?1", &[nombre.into()])
                    .map_err(storage)?;
                let especie_id = rows
                    .first()
                    .map(|r| col_i64(r, "id"))
                    .transpose()?
                    .ok_or_else(|| ServiceError::Internal(format!("species '{nombre}' not stored")))?;

                for categoria in &especie.categorias {
                    tx.exec(
                        "INSERT OR IGNORE INTO categorias_especie (especie_id, nombre) VALUES (?1, ?2)",
                        &[especie_id.into(), categoria.trim().into()],
                    )
                    .map_err(storage)?;
                }
            }

            for nombre in &seed.enfermedades {
                tx.exec("INSERT OR IGNORE INTO enfermedades (nombre) VALUES (?1)", &[nombre.trim().into()])
                    .map_err(storage)?;
            }
            for nombre in &seed.tipos_parte {
                tx.exec("INSERT OR IGNORE INTO tipos_parte (nombre) VALUES (?1)", &[nombre.trim().into()])
                    .map_err(storage)?;
            }
            for titular in &seed.titulares {
                tx.exec(
                    "INSERT OR IGNORE INTO titulares_faena (nombre, cuit) VALUES (?1, ?2)",
                    &[titular.nombre.trim().into(), titular.cuit.clone().into()],
                )
                .map_err(storage)?;
            }
            Ok(())
        })?;

        info!(
            especies = seed.especies.len(),
            enfermedades = seed.enfermedades.len(),
            tipos_parte = seed.tipos_parte.len(),
            titulares = seed.titulares.len(),
            "catalog seeded"
        );
        Ok(())
    }

    /// All species with their categories, in insertion order.
    pub fn list_especies(&self) -> Result<Vec<Especie>, ServiceError> {
        let especies = self
            .sql
            .query("SELECT id, nombre FROM especies ORDER BY id", &[])
            .map_err(storage)?;
        let categorias = self
            .sql
            .query(
                "SELECT id, especie_id, nombre FROM categorias_especie ORDER BY id",
                &[],
            )
            .map_err(storage)?;

        let mut out = Vec::with_capacity(especies.len());
        for row in &especies {
            out.push(Especie {
                id: col_i64(row, "id")?,
                nombre: col_str(row, "nombre")?,
                categorias: Vec::new(),
            });
        }
        for row in &categorias {
            let categoria = CategoriaEspecie {
                id: col_i64(row, "id")?,
                especie_id: col_i64(row, "especie_id")?,
                nombre: col_str(row, "nombre")?,
            };
            if let Some(especie) = out.iter_mut().find(|e| e.id == categoria.especie_id) {
                especie.categorias.push(categoria);
            }
        }
        Ok(out)
    }

    pub fn list_enfermedades(&self) -> Result<Vec<Enfermedad>, ServiceError> {
        let rows = self
            .sql
            .query("SELECT id, nombre FROM enfermedades ORDER BY id", &[])
            .map_err(storage)?;
        rows.iter()
            .map(|r| {
                Ok(Enfermedad {
                    id: col_i64(r, "id")?,
                    nombre: col_str(r, "nombre")?,
                })
            })
            .collect()
    }

    pub fn list_tipos_parte(&self) -> Result<Vec<TipoParte>, ServiceError> {
        let rows = self
            .sql
            .query("SELECT id, nombre FROM tipos_parte ORDER BY id", &[])
            .map_err(storage)?;
        rows.iter()
            .map(|r| {
                Ok(TipoParte {
                    id: col_i64(r, "id")?,
                    nombre: col_str(r, "nombre")?,
                })
            })
            .collect()
    }

    pub fn list_titulares(&self) -> Result<Vec<TitularFaena>, ServiceError> {
        let rows = self
            .sql
            .query("SELECT id, nombre, cuit FROM titulares_faena ORDER BY id", &[])
            .map_err(storage)?;
        rows.iter()
            .map(|r| {
                Ok(TitularFaena {
                    id: col_i64(r, "id")?,
                    nombre: col_str(r, "nombre")?,
                    cuit: col_opt_str(r, "cuit"),
                })
            })
            .collect()
    }
}

// ── Reference checks ──
//
// A body that names a missing reference row is a validation error, not a
// missing resource.

pub(crate) fn check_titular<E: SQLExec + ?Sized>(db: &E, id: i64) -> Result<(), ServiceError> {
    if exists(db, "SELECT 1 FROM titulares_faena WHERE id = ?1", &[id.into()])? {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!("titular de faena {id} does not exist")))
    }
}

/// The category must exist and belong to the species.
pub(crate) fn check_categoria<E: SQLExec + ?Sized>(
    db: &E,
    especie_id: i64,
    categoria_id: i64,
) -> Result<(), ServiceError> {
    if !exists(db, "SELECT 1 FROM especies WHERE id = ?1", &[especie_id.into()])? {
        return Err(ServiceError::Validation(format!("especie {especie_id} does not exist")));
    }
    let params: [Value; 2] = [categoria_id.into(), especie_id.into()];
    if exists(
        db,
        "SELECT 1 FROM categorias_especie WHERE id = ?1 AND especie_id = ?2",
        &params,
    )? {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "categoria {categoria_id} does not belong to especie {especie_id}"
        )))
    }
}

pub(crate) fn check_enfermedad<E: SQLExec + ?Sized>(db: &E, id: i64) -> Result<(), ServiceError> {
    if exists(db, "SELECT 1 FROM enfermedades WHERE id = ?1", &[id.into()])? {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!("enfermedad {id} does not exist")))
    }
}

pub(crate) fn check_tipo_parte<E: SQLExec + ?Sized>(db: &E, id: i64) -> Result<(), ServiceError> {
    if exists(db, "SELECT 1 FROM tipos_parte WHERE id = ?1", &[id.into()])? {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!("tipo de parte {id} does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EspecieSeed, TitularSeed};
    use crate::service::testing::seeded_service;

    #[test]
    fn seeded_especies_keep_order_and_categories() {
        let svc = seeded_service();
        let especies = svc.list_especies().unwrap();
        assert_eq!(especies.len(), 2);
        assert_eq!(especies[0].nombre, "Bovino");
        let cats: Vec<&str> = especies[0].categorias.iter().map(|c| c.nombre.as_str()).collect();
        assert_eq!(cats, vec!["Vaquillona", "Novillo"]);
        assert_eq!(especies[1].categorias[0].nombre, "Cordero");
        assert_eq!(especies[1].categorias[0].especie_id, especies[1].id);
    }

    #[test]
    fn reseeding_is_idempotent() {
        let svc = seeded_service();
        let seed = CatalogSeed {
            especies: vec![EspecieSeed {
                nombre: "Bovino".into(),
                categorias: vec!["Novillo".into(), "Toro".into()],
            }],
            enfermedades: vec!["Hidatidosis".into()],
            tipos_parte: vec![],
            titulares: vec![TitularSeed {
                nombre: "Frigorífico Municipal".into(),
                cuit: None,
            }],
        };
        svc.seed_catalog(&seed).unwrap();
        svc.seed_catalog(&seed).unwrap();

        let especies = svc.list_especies().unwrap();
        assert_eq!(especies.len(), 2);
        let cats: Vec<&str> = especies[0].categorias.iter().map(|c| c.nombre.as_str()).collect();
        assert_eq!(cats, vec!["Vaquillona", "Novillo", "Toro"]);
        assert_eq!(svc.list_enfermedades().unwrap().len(), 2);

        let titulares = svc.list_titulares().unwrap();
        assert_eq!(titulares.len(), 1);
        assert_eq!(titulares[0].cuit.as_deref(), Some("30-12345678-9"));
    }

    #[test]
    fn reserved_category_not_seeded() {
        let svc = seeded_service();
        let seed = CatalogSeed {
            especies: vec![EspecieSeed {
                nombre: "Porcino".into(),
                categorias: vec!["Capón".into(), "TOTAL".into()],
            }],
            ..Default::default()
        };
        let err = svc.seed_catalog(&seed).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.list_especies().unwrap().len(), 2);
    }

    #[test]
    fn reference_checks() {
        let svc = seeded_service();
        let db = svc.sql.as_ref();
        assert!(check_titular(db, 1).is_ok());
        assert!(matches!(check_titular(db, 9), Err(ServiceError::Validation(_))));
        assert!(check_categoria(db, 1, 2).is_ok());
        // Cordero is an Ovino category.
        assert!(matches!(check_categoria(db, 1, 3), Err(ServiceError::Validation(_))));
        assert!(matches!(check_categoria(db, 7, 1), Err(ServiceError::Validation(_))));
        assert!(check_enfermedad(db, 2).is_ok());
        assert!(check_enfermedad(db, 3).is_err());
        assert!(check_tipo_parte(db, 1).is_ok());
        assert!(check_tipo_parte(db, 0).is_err());
    }

    #[test]
    fn lists_are_ordered_by_id() {
        let svc = seeded_service();
        let tipos: Vec<String> = svc.list_tipos_parte().unwrap().into_iter().map(|t| t.nombre).collect();
        assert_eq!(tipos, vec!["Hígado", "Pulmón"]);
        let enf: Vec<i64> = svc.list_enfermedades().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(enf, vec![1, 2]);
    }
}

use tracing::warn;

use faena_core::ServiceError;
use faena_sql::SQLExec;

use crate::remanente::{reconcile, Declarado, Faenado, Remanente, TropaKey};
use super::{col_cantidad, col_i64, col_str, storage, FaenaService};

impl FaenaService {
    /// Slaughtered and remaining head count of a herd, per species and
    /// category. Read-only and recomputed on every call.
    pub fn remanente(&self, key: &TropaKey) -> Result<Remanente, ServiceError> {
        let db = self.sql.as_ref();

        let rows = match key {
            TropaKey::Id(id) => db.query(
                "SELECT id, numero, fecha FROM tropas WHERE id = ?1",
                &[(*id).into()],
            ),
            TropaKey::Numero(numero) => db.query(
                "SELECT id, numero, fecha FROM tropas WHERE numero = ?1",
                &[numero.as_str().into()],
            ),
        }
        .map_err(storage)?;
        let tropa = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("tropa {key} not found")))?;
        let tropa_id = col_i64(tropa, "id")?;

        let declarados = db
            .query(
                "SELECT e.nombre AS especie, c.nombre AS categoria, td.cantidad \
                 FROM tropa_detalles td \
                 JOIN especies e ON e.id = td.especie_id \
                 JOIN categorias_especie c ON c.id = td.categoria_id \
                 WHERE td.tropa_id = ?1 ORDER BY td.id",
                &[tropa_id.into()],
            )
            .map_err(storage)?
            .iter()
            .map(|r| {
                Ok(Declarado {
                    especie: col_str(r, "especie")?,
                    categoria: col_str(r, "categoria")?,
                    cantidad: col_cantidad(r, "cantidad")?,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let faenados = db
            .query(
                "SELECT e.nombre AS especie, c.nombre AS categoria, \
                        COALESCE(SUM(fd.cantidad), 0) AS cantidad \
                 FROM faena_detalles fd \
                 JOIN faenas f ON f.id = fd.faena_id \
                 JOIN tropa_detalles td ON td.id = fd.tropa_detalle_id \
                 JOIN especies e ON e.id = td.especie_id \
                 JOIN categorias_especie c ON c.id = td.categoria_id \
                 WHERE f.tropa_id = ?1 \
                 GROUP BY e.nombre, c.nombre",
                &[tropa_id.into()],
            )
            .map_err(storage)?
            .iter()
            .map(|r| {
                Ok(Faenado {
                    especie: col_str(r, "especie")?,
                    categoria: col_str(r, "categoria")?,
                    cantidad: col_cantidad(r, "cantidad")?,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let conciliado = reconcile(&declarados, &faenados);
        for s in &conciliado.sobrefaenas {
            warn!(
                tropa_id,
                especie = %s.especie,
                categoria = %s.categoria,
                declarado = s.declarado,
                faenado = s.faenado,
                "slaughtered more head than declared; remanente clamped to 0"
            );
        }

        Ok(Remanente {
            tropa_id,
            numero: col_str(tropa, "numero")?,
            fecha: col_str(tropa, "fecha")?,
            especies: conciliado.especies,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::model::{CantidadFaenada, NuevaFaena};
    use crate::service::testing::{nueva_tropa, seeded_service};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    struct LogWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogWriter;

        fn make_writer(&'a self) -> Self::Writer {
            LogWriter(Arc::clone(&self.0))
        }
    }

    impl io::Write for LogWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn faena(svc: &FaenaService, tropa_id: i64, fecha: &str, detalles: &[(i64, i64)]) {
        svc.record_faena(
            tropa_id,
            NuevaFaena {
                fecha: fecha.into(),
                detalles: detalles
                    .iter()
                    .map(|&(tropa_detalle_id, cantidad)| CantidadFaenada {
                        tropa_detalle_id,
                        cantidad,
                    })
                    .collect(),
            },
        )
        .unwrap();
    }

    #[test]
    fn two_categories_two_events() {
        let svc = seeded_service();
        let t = svc.create_tropa(nueva_tropa("T-100", &[(1, 1, 50), (1, 2, 30)])).unwrap();
        let (vaq, nov) = (t.detalles[0].id, t.detalles[1].id);
        faena(&svc, t.id, "2026-03-03", &[(vaq, 20)]);
        faena(&svc, t.id, "2026-03-04", &[(vaq, 10), (nov, 5)]);

        let r = svc.remanente(&TropaKey::Numero("T-100".into())).unwrap();
        assert_eq!(r.tropa_id, t.id);
        assert_eq!(r.numero, "T-100");
        assert_eq!(r.fecha, "2026-03-02");
        assert_eq!(
            serde_json::to_value(&r.especies).unwrap(),
            serde_json::json!({
                "Bovino": {
                    "Vaquillona": {"faenados": 30, "remanente": 20},
                    "Novillo": {"faenados": 5, "remanente": 25},
                    "TOTAL": {"faenados": 35, "remanente": 45},
                }
            })
        );
    }

    #[test]
    fn two_species() {
        let svc = seeded_service();
        let t = svc.create_tropa(nueva_tropa("T-200", &[(2, 3, 40), (1, 2, 12)])).unwrap();
        faena(&svc, t.id, "2026-03-03", &[(t.detalles[0].id, 40)]);

        let r = svc.remanente(&TropaKey::Id(t.id)).unwrap();
        let json = serde_json::to_string(&r.especies).unwrap();
        assert_eq!(
            json,
            r#"{"Ovino":{"Cordero":{"faenados":40,"remanente":0},"TOTAL":{"faenados":40,"remanente":0}},"Bovino":{"Novillo":{"faenados":0,"remanente":12},"TOTAL":{"faenados":0,"remanente":12}}}"#
        );
    }

    #[test]
    fn missing_tropa_is_not_found() {
        let svc = seeded_service();
        assert!(matches!(
            svc.remanente(&TropaKey::Numero("T-404".into())),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(svc.remanente(&TropaKey::Id(404)), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn tropa_without_detalles_is_empty() {
        let svc = seeded_service();
        let t = svc.create_tropa(nueva_tropa("T-0", &[])).unwrap();
        let r = svc.remanente(&TropaKey::Id(t.id)).unwrap();
        assert!(r.especies.is_empty());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let svc = seeded_service();
        let t = svc
            .create_tropa(nueva_tropa("T-5", &[(1, 2, 8), (2, 3, 3), (1, 1, 4)]))
            .unwrap();
        faena(&svc, t.id, "2026-03-03", &[(t.detalles[2].id, 1)]);

        let a = serde_json::to_string(&svc.remanente(&TropaKey::Id(t.id)).unwrap()).unwrap();
        let b = serde_json::to_string(&svc.remanente(&TropaKey::Numero("T-5".into())).unwrap()).unwrap();
        assert_eq!(a, b);
        // Declaration order, not alphabetical.
        assert!(a.find("Novillo").unwrap() < a.find("Vaquillona").unwrap());
        assert!(a.find("Bovino").unwrap() < a.find("Ovino").unwrap());
    }

    #[test]
    fn over_slaughter_is_clamped() {
        let svc = seeded_service();
        let t = svc.create_tropa(nueva_tropa("T-6", &[(1, 1, 10)])).unwrap();
        let d = t.detalles[0].id;
        faena(&svc, t.id, "2026-03-03", &[(d, 8)]);
        // Bypass the service checks to simulate legacy data.
        svc.sql
            .exec("UPDATE tropa_detalles SET cantidad = 5 WHERE id = ?1", &[d.into()])
            .unwrap();

        let r = svc.remanente(&TropaKey::Id(t.id)).unwrap();
        let bovino = &r.especies["Bovino"];
        assert_eq!(bovino.categorias["Vaquillona"].faenados, 8);
        assert_eq!(bovino.categorias["Vaquillona"].remanente, 0);
        assert_eq!(bovino.total.remanente, 0);
    }

    #[test]
    fn over_slaughter_logs_a_warning() {
        let svc = seeded_service();
        let t = svc.create_tropa(nueva_tropa("T-7", &[(1, 1, 10), (1, 2, 10)])).unwrap();
        let (vaq, nov) = (t.detalles[0].id, t.detalles[1].id);
        faena(&svc, t.id, "2026-03-03", &[(vaq, 8), (nov, 2)]);
        svc.sql
            .exec("UPDATE tropa_detalles SET cantidad = 5 WHERE id = ?1", &[vaq.into()])
            .unwrap();

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            svc.remanente(&TropaKey::Id(t.id)).unwrap();
        });

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let warnings: Vec<&str> = text.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1, "{text}");
        assert!(warnings[0].contains("remanente clamped to 0"));
        assert!(warnings[0].contains("categoria=Vaquillona"));
        assert!(warnings[0].contains("declarado=5"));
        assert!(warnings[0].contains("faenado=8"));
    }
}

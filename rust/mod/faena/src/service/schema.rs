use faena_core::ServiceError;
use faena_sql::{SQLExec, SQLStore};

/// SQL DDL statements to initialize the faena database schema.
///
/// All fields map directly to SQL columns. Remaining head counts are never
/// stored: they are derived from `tropa_detalles` and `faena_detalles` on read.
const SCHEMA: &[&str] = &[
    // Reference data (seeded from configuration).
    "CREATE TABLE IF NOT EXISTS especies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS categorias_especie (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        especie_id INTEGER NOT NULL REFERENCES especies(id),
        nombre TEXT NOT NULL,
        UNIQUE(especie_id, nombre)
    )",
    "CREATE TABLE IF NOT EXISTS titulares_faena (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE,
        cuit TEXT
    )",
    "CREATE TABLE IF NOT EXISTS enfermedades (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS tipos_parte (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE
    )",
    // Herds and declared head counts.
    "CREATE TABLE IF NOT EXISTS tropas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        numero TEXT NOT NULL UNIQUE,
        emisor TEXT,
        localidad TEXT,
        dte TEXT,
        guia_policial TEXT,
        fecha TEXT NOT NULL,
        titular_faena_id INTEGER NOT NULL REFERENCES titulares_faena(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tropa_detalles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tropa_id INTEGER NOT NULL REFERENCES tropas(id),
        especie_id INTEGER NOT NULL REFERENCES especies(id),
        categoria_id INTEGER NOT NULL REFERENCES categorias_especie(id),
        cantidad INTEGER NOT NULL CHECK (cantidad >= 0),
        UNIQUE(tropa_id, especie_id, categoria_id)
    )",
    // Slaughter events (append-only).
    "CREATE TABLE IF NOT EXISTS faenas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tropa_id INTEGER NOT NULL REFERENCES tropas(id),
        fecha TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS faena_detalles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        faena_id INTEGER NOT NULL REFERENCES faenas(id),
        tropa_detalle_id INTEGER NOT NULL REFERENCES tropa_detalles(id),
        cantidad INTEGER NOT NULL CHECK (cantidad > 0)
    )",
    // Seizures.
    "CREATE TABLE IF NOT EXISTS decomisos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        faena_id INTEGER NOT NULL REFERENCES faenas(id),
        enfermedad_id INTEGER NOT NULL REFERENCES enfermedades(id),
        tipo_parte_id INTEGER NOT NULL REFERENCES tipos_parte(id),
        cantidad INTEGER NOT NULL CHECK (cantidad > 0),
        observaciones TEXT,
        created_at TEXT NOT NULL
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_tropa_titular ON tropas(titular_faena_id)",
    "CREATE INDEX IF NOT EXISTS idx_tropa_det_tropa ON tropa_detalles(tropa_id)",
    "CREATE INDEX IF NOT EXISTS idx_faena_tropa ON faenas(tropa_id)",
    "CREATE INDEX IF NOT EXISTS idx_faena_det_faena ON faena_detalles(faena_id)",
    "CREATE INDEX IF NOT EXISTS idx_faena_det_tropa_det ON faena_detalles(tropa_detalle_id)",
    "CREATE INDEX IF NOT EXISTS idx_decomiso_faena ON decomisos(faena_id)",
];

pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        sql.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(format!("schema init failed: {}", e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faena_sql::SqliteStore;

    #[test]
    fn init_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        init_schema(&store).unwrap();
        init_schema(&store).unwrap();
        let rows = store
            .query(
                "SELECT COUNT(*) AS cnt FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                &[],
            )
            .unwrap();
        assert_eq!(rows[0].get_i64("cnt"), Some(10));
    }

    #[test]
    fn negative_declared_quantity_rejected_by_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        init_schema(&store).unwrap();
        store.exec("INSERT INTO especies (nombre) VALUES ('Bovino')", &[]).unwrap();
        store
            .exec("INSERT INTO categorias_especie (especie_id, nombre) VALUES (1, 'Vaca')", &[])
            .unwrap();
        store
            .exec("INSERT INTO titulares_faena (nombre) VALUES ('T')", &[])
            .unwrap();
        store
            .exec(
                "INSERT INTO tropas (numero, fecha, titular_faena_id, created_at, updated_at) \
                 VALUES ('T-1', '2026-01-01', 1, 'x', 'x')",
                &[],
            )
            .unwrap();
        let err = store
            .exec(
                "INSERT INTO tropa_detalles (tropa_id, especie_id, categoria_id, cantidad) VALUES (1, 1, 1, -1)",
                &[],
            )
            .unwrap_err();
        assert!(err.to_string().contains("CHECK"));
    }
}

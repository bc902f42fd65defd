pub mod catalog;
pub mod decomiso;
pub mod faena;
pub mod remanente;
pub mod schema;
pub mod tropa;

use std::sync::Arc;

use chrono::NaiveDate;

use faena_core::ServiceError;
use faena_sql::{Row, SQLError, SQLExec, SQLStore, SQLTx, Value};

/// Faena service: owns the injected SQL handle and provides business logic.
///
/// Reads go straight to the store; every read-compare-write sequence runs
/// inside one transaction through [`FaenaService::in_tx`].
pub struct FaenaService {
    pub(crate) sql: Arc<dyn SQLStore>,
}

impl FaenaService {
    /// Create the service and initialise the schema.
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql })
    }

    /// Run `f` inside a write transaction. The transaction commits only if
    /// `f` succeeds; any error rolls it back.
    pub(crate) fn in_tx<T>(
        &self,
        f: impl FnOnce(&dyn SQLTx) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let tx = self.sql.begin().map_err(storage)?;
        let out = f(tx.as_ref())?;
        tx.commit().map_err(storage)?;
        Ok(out)
    }
}

// ── Row helpers ──
//
// Rows are checked here, at the data-access boundary, before any arithmetic
// is applied to them.

pub(crate) fn storage(e: SQLError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

pub(crate) fn col_i64(row: &Row, name: &str) -> Result<i64, ServiceError> {
    row.get_i64(name)
        .ok_or_else(|| ServiceError::Storage(format!("missing integer column '{name}'")))
}

pub(crate) fn col_str(row: &Row, name: &str) -> Result<String, ServiceError> {
    row.get_str(name)
        .map(str::to_string)
        .ok_or_else(|| ServiceError::Storage(format!("missing text column '{name}'")))
}

pub(crate) fn col_opt_str(row: &Row, name: &str) -> Option<String> {
    row.get_str(name).map(str::to_string)
}

/// A head count column: present and non-negative.
pub(crate) fn col_cantidad(row: &Row, name: &str) -> Result<u64, ServiceError> {
    let v = col_i64(row, name)?;
    u64::try_from(v).map_err(|_| ServiceError::Storage(format!("negative quantity {v} in column '{name}'")))
}

/// Whether `sql` returns at least one row.
pub(crate) fn exists<E: SQLExec + ?Sized>(
    db: &E,
    sql: &str,
    params: &[Value],
) -> Result<bool, ServiceError> {
    Ok(!db.query(sql, params).map_err(storage)?.is_empty())
}

/// Total row count of a `SELECT COUNT(*) AS cnt` query.
pub(crate) fn count_of(rows: &[Row]) -> usize {
    rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize
}

// ── Input helpers ──

/// Validate a `YYYY-MM-DD` date and return it in canonical form.
pub(crate) fn parse_fecha(fecha: &str) -> Result<String, ServiceError> {
    NaiveDate::parse_from_str(fecha.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| ServiceError::Validation(format!("invalid date '{fecha}': expected YYYY-MM-DD")))
}

/// Trim an optional text field, turning blanks into `None`.
pub(crate) fn clean(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

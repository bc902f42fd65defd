//! Normalized JSON envelopes shared by every endpoint.
//!
//! ```json
//! {"success": true,  "data": {...}, "message": "...", "timestamp": "..."}
//! {"success": true,  "data": [...], "pagination": {"page": 1, "limit": 50, "total": 3, "pages": 1}, "timestamp": "..."}
//! {"success": false, "code": "NOT_FOUND", "message": "...", "details": {...}, "timestamp": "..."}
//! ```

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::types::{now_rfc3339, ListResult, PageParams};

/// Handler result for a plain success envelope.
pub type ApiResult<T> = Result<Json<Envelope<T>>, ServiceError>;

/// Handler result for a `201 Created` success envelope.
pub type ApiCreated<T> = Result<(StatusCode, Json<Envelope<T>>), ServiceError>;

/// Success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub timestamp: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: None,
            pagination: None,
            timestamp: now_rfc3339(),
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        let Json(mut env) = Self::success(data);
        env.message = Some(message.into());
        Json(env)
    }

    pub fn created(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::with_message(data, message))
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// Paginated list envelope. `pages` is `ceil(total / limit)`.
    pub fn paginated(result: ListResult<T>, page: &PageParams) -> Json<Self> {
        let Json(mut env) = Self::success(result.items);
        env.pagination = Some(Pagination::new(page.page, page.limit, result.total));
        Json(env)
    }
}

/// Pagination block of a paginated list envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl ErrorEnvelope {
    pub fn new(code: &str, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            message,
            details,
            timestamp: now_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_shape() {
        let Json(env) = Envelope::success(serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("message").is_none());
        assert!(json.get("pagination").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn created_has_status_and_message() {
        let (status, Json(env)) = Envelope::created(7, "tropa registrada");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(env.message.as_deref(), Some("tropa registrada"));
        assert_eq!(env.data, 7);
    }

    #[test]
    fn paginated_shape() {
        let result = ListResult {
            items: vec![1, 2],
            total: 5,
        };
        let page = PageParams::new(Some(2), Some(2));
        let Json(env) = Envelope::paginated(result, &page);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(
            json["pagination"],
            serde_json::json!({"page": 2, "limit": 2, "total": 5, "pages": 3})
        );
    }

    #[test]
    fn pages_rounds_up() {
        assert_eq!(Pagination::new(1, 50, 0).pages, 0);
        assert_eq!(Pagination::new(1, 50, 50).pages, 1);
        assert_eq!(Pagination::new(1, 50, 51).pages, 2);
    }
}

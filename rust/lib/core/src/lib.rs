pub mod config;
pub mod envelope;
pub mod error;
pub mod module;
pub mod types;

pub use config::ServiceConfig;
pub use envelope::{ApiCreated, ApiResult, Envelope, ErrorEnvelope, Pagination};
pub use error::ServiceError;
pub use module::Module;
pub use types::{merge_patch, now_rfc3339, ListResult, PageParams};

pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod quota;
pub mod repository;
pub mod service;

pub use error::*;
pub use export::{ExportDispatcher, ExportError, TracingExportDispatcher};
pub use models::*;
pub use quota::*;
pub use repository::*;
pub use service::*;

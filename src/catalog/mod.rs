pub mod handlers;
pub mod models;
pub mod repository;

pub use models::*;
pub use repository::CatalogRepository;

#[cfg(test)]
pub(crate) use models::fixtures;

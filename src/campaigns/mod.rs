// Campaigns module
// Campaign model, derived lifecycle state and admin CRUD

pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod repository;

pub use error::CampaignError;
pub use lifecycle::{today, CampaignStatus, ListBucket};
pub use models::*;
pub use repository::CampaignRepository;

#[cfg(test)]
pub(crate) use models::fixtures;

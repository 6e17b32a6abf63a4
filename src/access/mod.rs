// Campaign access
// Decides who may open a campaign and hands out portal sessions

pub mod error;
pub mod handlers;
pub mod models;
pub mod resolver;

pub use error::AccessError;
pub use models::*;
pub use resolver::{check_open_and_country, check_password, evaluate_gate, AccessResolver};

// Authentication module
// Validates staff tokens and issues campaign-bound portal sessions

pub mod error;
pub mod middleware;
pub mod models;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{AdminUser, PortalSession, RepresentativeUser};
pub use models::Role;
pub use token::{SessionClaims, StaffClaims, TokenService};

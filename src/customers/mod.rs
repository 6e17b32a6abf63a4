// Customers module
// Customer number formats, the external directory adapter and the local cache

pub mod directory;
pub mod error;
pub mod handlers;
pub mod models;
pub mod number;
pub mod repository;

pub use directory::{CustomerDirectory, InMemoryCustomerDirectory, PgCustomerDirectory};
pub use error::DirectoryError;
pub use models::*;
pub use number::{CustomerList, CustomerNumber, InvalidCustomerNumber};
pub use repository::CustomerRepository;

pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::database_service::DatabaseService;
pub use crypto::token::{Claims, TokenService};
pub use domain::{Calculation, Operation, PublicUser, User};

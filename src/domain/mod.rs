//! Domain types: users, calculations, and the arithmetic rules that bind them.

pub mod calculation;
pub mod user;

pub use calculation::{Calculation, ComputeError, Operation};
pub use user::{PublicUser, User};

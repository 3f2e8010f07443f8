//! Application services: what the terminal client calls.
//!
//! Services own the ordering rule for mutations: remote call first, cache
//! synchronization only after success, caller sees the result last.

pub mod auth;
pub mod error;
pub mod recipes;

pub use auth::AuthService;
pub use error::ServiceError;
pub use recipes::{FetchPolicy, PhotoReplacement, RecipeService, RecipeUpdate};

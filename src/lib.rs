//! Recipeez: client for the Recipeez recipe API with a mutation-synchronized
//! local cache.

pub mod application;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod infra;
mod lock;
pub mod session;

//! Client-side rules a recipe must satisfy before any request is sent.

pub mod error;
pub mod photo;
pub mod recipe;

pub use error::ValidationError;
pub use photo::PhotoUpload;
pub use recipe::{RecipeDraft, RecipeFields, parse_ingredients, validate_credentials};

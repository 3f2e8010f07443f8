use thiserror::Error;

/// Input rejected before reaching the network. The cache is never touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("at least one ingredient is required")]
    NoIngredients,
    #[error("`{file_name}` is not an image (detected {content_type})")]
    NotAnImage {
        file_name: String,
        content_type: String,
    },
    #[error("`{file_name}` is empty")]
    EmptyPhoto { file_name: String },
    #[error("photo is {size} bytes; the limit is {limit} bytes")]
    PhotoTooLarge { size: u64, limit: u64 },
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

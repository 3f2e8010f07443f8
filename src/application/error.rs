use recipeez_api_types::Recipe;
use thiserror::Error;

use crate::client::ClientError;
use crate::domain::ValidationError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not signed in")]
    NotSignedIn,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The recipe exists server-side without a photo.
    #[error("recipe {} was created but the photo upload failed: {source}", .recipe.id)]
    PhotoUpload {
        recipe: Box<Recipe>,
        #[source]
        source: ClientError,
    },
}

impl ServiceError {
    pub fn is_session_expired(&self) -> bool {
        match self {
            Self::Client(err) | Self::PhotoUpload { source: err, .. } => err.is_session_expired(),
            Self::NotSignedIn | Self::Validation(_) => false,
        }
    }

    /// Whether the user has to go through sign-in before retrying.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::NotSignedIn) || self.is_session_expired()
    }

    /// The recipe left behind by a create whose photo step failed.
    pub fn created_recipe(&self) -> Option<&Recipe> {
        match self {
            Self::PhotoUpload { recipe, .. } => Some(recipe),
            _ => None,
        }
    }
}

//! Mutation effects.
//!
//! Every successful remote mutation is described by one `MutationEffect`. Each
//! partial-result shape carries its own merge into a full [`Recipe`].

use recipeez_api_types::{PhotoResponse, Recipe, RecipeFieldsResponse};
use serde::Serialize;
use time::OffsetDateTime;

/// Fields echoed by `PUT /recipes/{id}`. `None` means "not returned, keep what
/// the cache has".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipeFieldsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl RecipeFieldsPatch {
    /// Shallow merge: returned fields overwrite, absent fields are retained.
    pub fn apply_to(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            recipe.description.clone_from(description);
        }
        if let Some(ingredients) = &self.ingredients {
            recipe.ingredients.clone_from(ingredients);
        }
        if let Some(instructions) = &self.instructions {
            recipe.instructions.clone_from(instructions);
        }
        if let Some(updated_at) = self.updated_at {
            recipe.updated_at = updated_at;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<RecipeFieldsResponse> for RecipeFieldsPatch {
    fn from(response: RecipeFieldsResponse) -> Self {
        Self {
            title: response.title,
            description: response.description,
            ingredients: response.ingredients,
            instructions: response.instructions,
            updated_at: response.updated_at,
        }
    }
}

/// Result of a photo upload: the new URL and, when the server sends it, the
/// new `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoPatch {
    pub photo: String,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl PhotoPatch {
    /// Overwrites `photo` and, if present, `updated_at`; nothing else.
    pub fn apply_to(&self, recipe: &mut Recipe) {
        recipe.photo = Some(self.photo.clone());
        if let Some(updated_at) = self.updated_at {
            recipe.updated_at = updated_at;
        }
    }
}

impl From<PhotoResponse> for PhotoPatch {
    fn from(response: PhotoResponse) -> Self {
        Self {
            photo: response.photo,
            updated_at: response.updated_at,
        }
    }
}

/// What a completed mutation did, as far as cached views are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEffect {
    Created(Recipe),
    Updated { id: String, patch: RecipeFieldsPatch },
    PhotoReplaced { id: String, patch: PhotoPatch },
    Deleted { id: String },
}

impl MutationEffect {
    pub fn recipe_id(&self) -> &str {
        match self {
            Self::Created(recipe) => &recipe.id,
            Self::Updated { id, .. } | Self::PhotoReplaced { id, .. } | Self::Deleted { id } => id,
        }
    }

    /// Short label used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated { .. } => "updated",
            Self::PhotoReplaced { .. } => "photo_replaced",
            Self::Deleted { .. } => "deleted",
        }
    }

    /// Merge this effect into an existing copy of the same recipe. Returns
    /// `false` for effects that do not patch fields (create, delete).
    pub(crate) fn merge_into(&self, recipe: &mut Recipe) -> bool {
        match self {
            Self::Updated { patch, .. } => {
                patch.apply_to(recipe);
                true
            }
            Self::PhotoReplaced { patch, .. } => {
                patch.apply_to(recipe);
                true
            }
            Self::Created(_) | Self::Deleted { .. } => false,
        }
    }
}

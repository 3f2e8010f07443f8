//! Recipe form rules.

use recipeez_api_types::{RecipeWriteRequest, SignInRequest};

use super::error::ValidationError;
use super::photo::PhotoUpload;

/// Separator used when ingredients are typed as one line.
pub const INGREDIENT_SEPARATOR: char = ';';

/// The editable fields of a recipe, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFields {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

impl RecipeFields {
    /// Check required fields and produce the request body. Surrounding
    /// whitespace is trimmed and blank ingredients are dropped, keeping the
    /// order of the rest.
    pub fn validate(&self) -> Result<RecipeWriteRequest, ValidationError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let instructions = required("instructions", &self.instructions)?;

        let ingredients: Vec<String> = self
            .ingredients
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if ingredients.is_empty() {
            return Err(ValidationError::NoIngredients);
        }

        Ok(RecipeWriteRequest {
            title,
            description,
            ingredients,
            instructions,
        })
    }
}

/// A new recipe: metadata plus an optional photo uploaded after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub fields: RecipeFields,
    pub photo: Option<PhotoUpload>,
}

impl RecipeDraft {
    pub fn new(fields: RecipeFields) -> Self {
        Self {
            fields,
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: PhotoUpload) -> Self {
        self.photo = Some(photo);
        self
    }
}

/// Split a `;`-separated ingredient line.
pub fn parse_ingredients(raw: &str) -> Vec<String> {
    raw.split(INGREDIENT_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate_credentials(email: &str, password: &str) -> Result<SignInRequest, ValidationError> {
    let email = required("email", email)?;
    if password.trim().is_empty() {
        return Err(ValidationError::missing("password"));
    }
    Ok(SignInRequest {
        email,
        password: password.to_string(),
    })
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}

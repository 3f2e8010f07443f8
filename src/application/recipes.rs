//! Recipe queries and mutations.
//!
//! Queries read through the cache according to a [`FetchPolicy`]. Mutations
//! hit the API first and hand the result to [`RecipeCache::apply`] only when
//! the call succeeded, so a failed mutation never changes a cached view.

use std::sync::Arc;

use recipeez_api_types::{PhotoResponse, Recipe, RecipeFieldsResponse, RecipePage};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ListKey, MutationEffect, PhotoPatch, RecipeCache, RecipeFieldsPatch};
use crate::client::{ApiClient, ClientError};
use crate::domain::{PhotoUpload, RecipeDraft, RecipeFields};
use crate::session::SessionStore;

use super::error::ServiceError;

const RECIPES: &str = "recipes";
const PHOTO: &str = "photo";

/// How a query may use the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Serve a fresh resident entry; fetch and store otherwise.
    #[default]
    CacheFirst,
    /// Always fetch, then overwrite the entry.
    NetworkOnly,
}

/// Outcome of an update: the fields the server echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeUpdate {
    pub id: String,
    #[serde(flatten)]
    pub patch: RecipeFieldsPatch,
}

/// Outcome of a photo replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoReplacement {
    pub id: String,
    #[serde(flatten)]
    pub photo: PhotoPatch,
}

#[derive(Clone)]
pub struct RecipeService {
    client: ApiClient,
    session: Arc<SessionStore>,
    cache: Arc<RecipeCache>,
    max_photo_bytes: u64,
}

impl RecipeService {
    pub fn new(
        client: ApiClient,
        session: Arc<SessionStore>,
        cache: Arc<RecipeCache>,
        max_photo_bytes: u64,
    ) -> Self {
        Self {
            client,
            session,
            cache,
            max_photo_bytes,
        }
    }

    /// Upload limit for photos, in bytes.
    pub fn max_photo_bytes(&self) -> u64 {
        self.max_photo_bytes
    }

    pub async fn list_recipes(
        &self,
        key: ListKey,
        policy: FetchPolicy,
    ) -> Result<RecipePage, ServiceError> {
        self.ensure_signed_in()?;
        if policy == FetchPolicy::CacheFirst
            && let Some(page) = self.cache.get_fresh_list(&key)
        {
            debug!(key = %key, "Serving list from cache");
            return Ok(page);
        }

        let page: RecipePage = self.client.get_json(&[RECIPES], &key.query_pairs()).await?;
        debug!(key = %key, count = page.recipes.len(), "Fetched recipe list");
        self.cache.set_list(key, page.clone());
        Ok(page)
    }

    pub async fn get_recipe(&self, id: &str, policy: FetchPolicy) -> Result<Recipe, ServiceError> {
        self.ensure_signed_in()?;
        if policy == FetchPolicy::CacheFirst
            && let Some(recipe) = self.cache.get_fresh_detail(id)
        {
            debug!(recipe_id = id, "Serving recipe from cache");
            return Ok(recipe);
        }

        let recipe: Recipe = self.client.get_json(&[RECIPES, id], &[]).await?;
        self.cache.set_detail(recipe.clone());
        Ok(recipe)
    }

    /// Create the metadata record, then upload the photo if the draft has one.
    ///
    /// When the photo step fails the recipe still exists server-side; it is
    /// returned inside [`ServiceError::PhotoUpload`] and no list is patched.
    pub async fn create_recipe(&self, draft: RecipeDraft) -> Result<Recipe, ServiceError> {
        self.ensure_signed_in()?;
        let request = draft.fields.validate()?;
        if let Some(photo) = &draft.photo {
            photo.validate(self.max_photo_bytes)?;
        }

        let mut recipe: Recipe = self
            .client
            .send_json(Method::POST, &[RECIPES], &request)
            .await?;
        info!(recipe_id = %recipe.id, "Recipe created");

        if let Some(photo) = draft.photo {
            match self.upload_photo(Method::POST, &recipe.id, photo).await {
                Ok(patch) => patch.apply_to(&mut recipe),
                Err(source) => {
                    warn!(recipe_id = %recipe.id, error = %source, "Photo upload failed after create");
                    return Err(ServiceError::PhotoUpload {
                        recipe: Box::new(recipe),
                        source,
                    });
                }
            }
        }

        self.cache.apply(&MutationEffect::Created(recipe.clone()));
        Ok(recipe)
    }

    pub async fn update_recipe(
        &self,
        id: &str,
        fields: RecipeFields,
    ) -> Result<RecipeUpdate, ServiceError> {
        self.ensure_signed_in()?;
        let request = fields.validate()?;

        let response: RecipeFieldsResponse = self
            .client
            .send_json(Method::PUT, &[RECIPES, id], &request)
            .await?;
        let patch = RecipeFieldsPatch::from(response);
        if patch.is_empty() {
            debug!(recipe_id = id, "Update response echoed no fields");
        }

        self.cache.apply(&MutationEffect::Updated {
            id: id.to_string(),
            patch: patch.clone(),
        });
        info!(recipe_id = id, "Recipe updated");
        Ok(RecipeUpdate {
            id: id.to_string(),
            patch,
        })
    }

    pub async fn replace_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
    ) -> Result<PhotoReplacement, ServiceError> {
        self.ensure_signed_in()?;
        photo.validate(self.max_photo_bytes)?;

        let patch = self.upload_photo(Method::PUT, id, photo).await?;
        self.cache.apply(&MutationEffect::PhotoReplaced {
            id: id.to_string(),
            patch: patch.clone(),
        });
        info!(recipe_id = id, "Recipe photo replaced");
        Ok(PhotoReplacement {
            id: id.to_string(),
            photo: patch,
        })
    }

    pub async fn delete_recipe(&self, id: &str) -> Result<(), ServiceError> {
        self.ensure_signed_in()?;
        self.client.send_empty(Method::DELETE, &[RECIPES, id]).await?;
        self.cache.apply(&MutationEffect::Deleted { id: id.to_string() });
        info!(recipe_id = id, "Recipe deleted");
        Ok(())
    }

    async fn upload_photo(
        &self,
        method: Method,
        id: &str,
        photo: PhotoUpload,
    ) -> Result<PhotoPatch, ClientError> {
        let (file_name, content_type, bytes) = photo.into_parts();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&content_type)?;
        let form = Form::new().part(PHOTO, part);
        let response: PhotoResponse = self
            .client
            .send_multipart(method, &[RECIPES, id, PHOTO], form)
            .await?;
        Ok(PhotoPatch::from(response))
    }

    fn ensure_signed_in(&self) -> Result<(), ServiceError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ServiceError::NotSignedIn)
        }
    }
}

use std::sync::Arc;

use recipeez_api_types::SignInResponse;
use tracing::info;

use crate::cache::RecipeCache;
use crate::client::ApiClient;
use crate::domain::validate_credentials;
use crate::session::{Session, SessionStore};

use super::error::ServiceError;

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    session: Arc<SessionStore>,
    cache: Arc<RecipeCache>,
}

impl AuthService {
    pub fn new(client: ApiClient, session: Arc<SessionStore>, cache: Arc<RecipeCache>) -> Self {
        Self {
            client,
            session,
            cache,
        }
    }

    /// Exchange credentials for a session. On rejection nothing changes.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let request = validate_credentials(email, password)?;
        let response = self.client.sign_in(&request).await?;
        let user = display_identity(&response, &request.email);

        if self.session.last_user().as_deref() != Some(user.as_str()) {
            // Entries fetched under another identity must not leak into this one.
            self.cache.clear();
        }

        self.session.set_session(user.clone(), response.token.clone());
        info!(user = %user, "Signed in");
        Ok(Session::new(user, response.token))
    }

    /// Drop the session and every cached entry.
    pub fn sign_out(&self) {
        self.session.clear_session();
        self.cache.clear();
    }

    pub fn current(&self) -> Option<Session> {
        self.session.current()
    }
}

/// `name`, then the response `email`, then the email used to sign in.
fn display_identity(response: &SignInResponse, email: &str) -> String {
    [response.name.as_deref(), response.email.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(email)
        .to_string()
}

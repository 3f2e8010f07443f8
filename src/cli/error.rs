use thiserror::Error;

use crate::application::ServiceError;
use crate::client::ClientError;
use crate::config::LoadError;
use crate::domain::ValidationError;
use crate::infra::error::InfraError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read from stdin: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Service(ServiceError::Validation(err))
    }
}

impl CliError {
    pub fn requires_sign_in(&self) -> bool {
        match self {
            Self::Service(err) => err.requires_sign_in(),
            Self::Client(err) => err.is_session_expired(),
            _ => false,
        }
    }

    /// Suggested next step, if there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        if self.requires_sign_in() {
            return Some("Run: recipeez sign-in --email <EMAIL>");
        }
        match self {
            Self::Config(LoadError::Invalid {
                key: "api.base_url",
                ..
            }) => Some("Pass --api-url or set RECIPEEZ_API_URL"),
            Self::Client(ClientError::InvalidCredentials)
            | Self::Service(ServiceError::Client(ClientError::InvalidCredentials)) => {
                Some("Check the email and password, then sign in again")
            }
            _ => None,
        }
    }
}

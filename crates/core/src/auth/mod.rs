//! Request authentication for the library server.
//!
//! The server hands every request to an [`Authenticator`]; which one is
//! chosen by `[library_server.auth]`.

mod basic;
mod none;
mod types;

pub use basic::BasicAuthenticator;
pub use none::NoneAuthenticator;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// Label used for the auth failure metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "missing_credentials",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::ConfigurationError(_) => "configuration",
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the identity
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}

/// Builds the authenticator selected by `config`.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::Basic => {
            let username = config.username.clone().ok_or_else(|| {
                AuthError::ConfigurationError("username must be set for basic auth".to_string())
            })?;
            let password = config.password.clone().ok_or_else(|| {
                AuthError::ConfigurationError("password must be set for basic auth".to_string())
            })?;
            Ok(Box::new(BasicAuthenticator::new(username, password)))
        }
    }
}

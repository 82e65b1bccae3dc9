use std::sync::Arc;

use tracing::{info, instrument};

use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User, viewer::AuthenticatedUser};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

/// A signed-in user together with the session token to hand back to the browser.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthenticatedUser,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        screen_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, DomainError> {
        let hash =
            hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = self
            .repo
            .create(User::new(screen_name.to_string(), email.to_lowercase(), hash))
            .await?;
        self.issue(&user)
    }

    /// Unknown screen names and wrong passwords fail the same way.
    #[instrument(skip(self, password))]
    pub async fn login(&self, screen_name: &str, password: &str) -> Result<Session, DomainError> {
        let user = self
            .repo
            .find_by_screen_name(screen_name)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }

        self.issue(&user)
    }

    fn issue(&self, user: &User) -> Result<Session, DomainError> {
        let authenticated = AuthenticatedUser {
            id: user.id,
            screen_name: user.screen_name.clone(),
        };
        let token = self
            .keys
            .generate_token(&authenticated)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        info!(user_id = %user.id, screen_name = %user.screen_name, "session issued");
        Ok(Session {
            user: authenticated,
            token,
        })
    }
}

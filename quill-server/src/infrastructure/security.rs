use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::viewer::AuthenticatedUser;

#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: String, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn generate_token(&self, user: &AuthenticatedUser) -> Result<String, jsonwebtoken::errors::Error> {
        let issued = Utc::now();
        let expires = issued
            .checked_add_signed(self.ttl)
            .ok_or(ErrorKind::InvalidToken)?;
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.screen_name.clone(),
            exp: expires.timestamp() as usize,
            iat: issued.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub exp: usize,
    pub iat: usize,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = uuid::Error;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(AuthenticatedUser {
            id: Uuid::parse_str(&claims.sub)?,
            screen_name: claims.name,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Malformed stored hashes count as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(secret.into(), Duration::hours(1))
    }

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            screen_name: "alice".into(),
        }
    }

    #[test]
    fn token_carries_user_identity() {
        let user = alice();
        let token = keys("secret").generate_token(&user).unwrap();
        let claims = keys("secret").verify_token(&token).unwrap();
        assert_eq!(AuthenticatedUser::try_from(claims).unwrap(), user);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = keys("secret").generate_token(&alice()).unwrap();
        assert!(keys("other").verify_token(&token).is_err());
        assert!(keys("secret").verify_token("not-a-token").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = JwtKeys::new("secret".into(), Duration::hours(-2));
        let token = expired.generate_token(&alice()).unwrap();
        assert!(expired.verify_token(&token).is_err());
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let keys = JwtKeys::new("secret".into(), Duration::hours(10_000_000_000));
        assert!(keys.generate_token(&alice()).is_err());
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "garbage"));
    }
}

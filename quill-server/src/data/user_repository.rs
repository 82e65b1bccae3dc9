use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use crate::domain::error::DomainError;
use crate::domain::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the screen name or email is already registered.
    async fn create(&self, user: User) -> Result<User, DomainError>;
    async fn find_by_screen_name(&self, screen_name: &str) -> Result<Option<User>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, screen_name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.screen_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .map(str::to_owned);
            match constraint.as_deref() {
                Some(c) if c.contains("screen_name") => {
                    DomainError::Conflict("screen name is already taken".to_string())
                }
                Some(c) if c.contains("email") => {
                    DomainError::Conflict("email is already registered".to_string())
                }
                _ => {
                    error!("failed to create user: {}", e);
                    DomainError::Internal(format!("database error: {}", e))
                }
            }
        })?;

        info!(user_id = %user.id, screen_name = %user.screen_name, "user created");
        Ok(user)
    }

    async fn find_by_screen_name(&self, screen_name: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, screen_name, email, password_hash, created_at
            FROM users
            WHERE screen_name = $1
            "#,
        )
        .bind(screen_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find user by screen name {}: {}", screen_name, e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub screen_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(screen_name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            screen_name,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

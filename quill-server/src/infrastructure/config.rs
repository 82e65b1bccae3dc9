use anyhow::{Context, anyhow};

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Without a database URL the server keeps everything in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub session_cookie: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = var("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse::<u16>()
            .context("invalid PORT")?;
        let database_url = var("DATABASE_URL");
        let database_max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "20".into())
            .parse::<u32>()
            .context("invalid DATABASE_MAX_CONNECTIONS")?;
        if database_max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }
        let jwt_secret = var("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;
        let session_cookie = var("SESSION_COOKIE").unwrap_or_else(|| "quill_session".into());
        let session_ttl_hours = var("SESSION_TTL_HOURS")
            .unwrap_or_else(|| "24".into())
            .parse::<i64>()
            .context("invalid SESSION_TTL_HOURS")?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            return Err(anyhow!(
                "SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}"
            ));
        }
        let secure_cookies = match var("SECURE_COOKIES").as_deref() {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => return Err(anyhow!("invalid SECURE_COOKIES: {other}")),
        };

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            session_cookie,
            session_ttl_hours,
            secure_cookies,
        })
    }
}

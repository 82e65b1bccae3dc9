use std::sync::Arc;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::{self, ServiceConfig};
use actix_web::{App, HttpServer};
use anyhow::Context;
use chrono::Duration;
use tracing::{info, warn};

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::data::memory::{InMemoryPostRepository, InMemoryUserRepository};
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::clock::{Clock, SystemClock};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database::{create_pool, run_migrations};
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::RequestTracing;
use crate::presentation::viewer::{SessionCookie, SessionResolver, ViewerResolver};
use crate::presentation::views::Views;

/// Everything the handlers pull out of app data.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
    pub views: Views,
    pub clock: Arc<dyn Clock>,
    pub resolver: Arc<dyn ViewerResolver>,
    pub session: SessionCookie,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(
            config.jwt_secret.clone(),
            Duration::hours(config.session_ttl_hours),
        );
        let auth = AuthService::new(Arc::clone(&users), keys);
        let resolver: Arc<dyn ViewerResolver> = Arc::new(SessionResolver::new(
            auth.keys().clone(),
            config.session_cookie.clone(),
        ));

        Ok(Self {
            auth,
            posts: PostService::new(posts, users),
            views: Views::load().context("failed to compile templates")?,
            clock,
            resolver,
            session: SessionCookie {
                name: config.session_cookie.clone(),
                secure: config.secure_cookies,
                ttl_hours: config.session_ttl_hours,
            },
        })
    }

    /// Postgres when `DATABASE_URL` is set, in-memory storage otherwise.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let (users, posts): (Arc<dyn UserRepository>, Arc<dyn PostRepository>) =
            match &config.database_url {
                Some(url) => {
                    let pool = create_pool(url, config.database_max_connections)
                        .await
                        .context("failed to connect to database")?;
                    run_migrations(&pool)
                        .await
                        .context("failed to run migrations")?;
                    (
                        Arc::new(PostgresUserRepository::new(pool.clone())),
                        Arc::new(PostgresPostRepository::new(pool)),
                    )
                }
                None => {
                    warn!("DATABASE_URL not set, keeping users and posts in memory");
                    (
                        Arc::new(InMemoryUserRepository::new()),
                        Arc::new(InMemoryPostRepository::new()),
                    )
                }
            };

        Self::new(users, posts, Arc::new(SystemClock), config)
    }

    pub fn configure(&self, cfg: &mut ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.posts.clone()))
            .app_data(web::Data::new(self.views.clone()))
            .app_data(web::Data::new(Arc::clone(&self.clock)))
            .app_data(web::Data::new(Arc::clone(&self.resolver)))
            .app_data(web::Data::new(self.session.clone()))
            .configure(handlers::routes);
    }
}

pub async fn start_server(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(RequestTracing)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("Referrer-Policy", "same-origin"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .configure(|cfg| state.configure(cfg))
            .default_service(web::to(handlers::not_found))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    info!("HTTP server stopped");
    Ok(())
}

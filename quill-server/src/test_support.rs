//! Shared setup for handler tests: in-memory storage, a pinned clock and
//! helpers for seeding users and posts.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use chrono::{DateTime, TimeZone, Utc};

use crate::data::memory::{InMemoryPostRepository, InMemoryUserRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::post::{PostDetail, PostDraft};
use crate::domain::user::User;
use crate::domain::viewer::AuthenticatedUser;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::hash_password;
use crate::server::AppState;

pub const PASSWORD: &str = "password123";

pub struct Fixture {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub clock: Arc<FixedClock>,
    pub now: DateTime<Utc>,
}

fn config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        database_max_connections: 1,
        jwt_secret: "test-secret".into(),
        session_cookie: "quill_session".into(),
        session_ttl_hours: 1,
        secure_cookies: false,
    }
}

impl Fixture {
    pub fn new() -> Self {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::new(users.clone(), posts, clock.clone(), &config()).unwrap();
        Self {
            state,
            users,
            clock,
            now,
        }
    }

    pub async fn user(&self, screen_name: &str) -> User {
        let hash = hash_password(PASSWORD).unwrap();
        self.users
            .create(User::new(
                screen_name.into(),
                format!("{screen_name}@example.com"),
                hash,
            ))
            .await
            .unwrap()
    }

    /// Seeds a post with three tags, two images and a thumbnail.
    pub async fn post(
        &self,
        author: &User,
        title: &str,
        publish_at: DateTime<Utc>,
        is_private: bool,
    ) -> PostDetail {
        let draft = PostDraft {
            title: title.into(),
            body: format!("Body of {title}"),
            publish_at: Some(publish_at),
            is_private,
            tags: vec!["tag-one".into(), "tag-two".into(), "tag-three".into()],
            images: vec![
                "https://img.example/one.png".into(),
                "https://img.example/two.png".into(),
            ],
            thumbnail_url: Some("https://img.example/thumb.png".into()),
        };
        self.state
            .posts
            .create_post(&authenticated(author), draft, self.now)
            .await
            .unwrap()
    }

    pub fn session(&self, user: &User) -> Cookie<'static> {
        let token = self
            .state
            .auth
            .keys()
            .generate_token(&authenticated(user))
            .unwrap();
        self.state.session.issue(token)
    }

    pub async fn body(res: ServiceResponse) -> String {
        String::from_utf8(test::read_body(res).await.to_vec()).unwrap()
    }
}

fn authenticated(user: &User) -> AuthenticatedUser {
    AuthenticatedUser {
        id: user.id,
        screen_name: user.screen_name.clone(),
    }
}

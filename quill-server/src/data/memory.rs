//! In-memory repositories, used when no database is configured. Data is lost on
//! restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostDetail, Tag};
use crate::domain::user::User;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.screen_name == user.screen_name) {
            return Err(DomainError::Conflict("screen name is already taken".to_string()));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict("email is already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_screen_name(&self, screen_name: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.screen_name == screen_name)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, PostDetail>>,
    // tag name -> id, so that tags are shared between posts like the tags table
    tags: RwLock<HashMap<String, Uuid>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn intern_tags(&self, tags: Vec<Tag>) -> Vec<Tag> {
        let mut known = self.tags.write().await;
        tags.into_iter()
            .map(|tag| {
                let id = *known.entry(tag.name.clone()).or_insert(tag.id);
                Tag { id, name: tag.name }
            })
            .collect()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, mut post: PostDetail) -> Result<PostDetail, DomainError> {
        post.tags = self.intern_tags(post.tags).await;

        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.post.id) {
            return Err(DomainError::Internal("duplicate post id".to_string()));
        }
        if posts
            .values()
            .any(|p| p.post.author_id == post.post.author_id && p.post.slug == post.post.slug)
        {
            return Err(DomainError::SlugTaken);
        }
        posts.insert(post.post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, mut post: PostDetail) -> Result<Option<PostDetail>, DomainError> {
        post.tags = self.intern_tags(post.tags).await;

        let mut posts = self.posts.write().await;
        let Some(stored) = posts
            .get_mut(&post.post.id)
            .filter(|stored| stored.post.author_id == post.post.author_id)
        else {
            return Ok(None);
        };

        post.post.slug = stored.post.slug.clone();
        post.post.created_at = stored.post.created_at;
        *stored = post.clone();
        Ok(Some(post))
    }

    async fn delete(&self, author_id: Uuid, post_id: Uuid) -> Result<bool, DomainError> {
        let mut posts = self.posts.write().await;
        let owned = posts
            .get(&post_id)
            .is_some_and(|stored| stored.post.author_id == author_id);
        if owned {
            posts.remove(&post_id);
        }
        Ok(owned)
    }

    async fn find_by_author_and_slug(
        &self,
        author_id: Uuid,
        slug: &str,
    ) -> Result<Option<PostDetail>, DomainError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .find(|p| p.post.author_id == author_id && p.post.slug == slug)
            .cloned())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.post.author_id == author_id)
            .map(|p| p.post.clone())
            .collect();
        posts.sort_by(|a, b| b.publish_at.cmp(&a.publish_at));
        Ok(posts)
    }

    async fn slug_taken(&self, author_id: Uuid, slug: &str) -> Result<bool, DomainError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .any(|p| p.post.author_id == author_id && p.post.slug == slug))
    }
}

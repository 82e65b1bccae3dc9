use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slug that collides with the create-post route and is never handed out.
pub const RESERVED_SLUG: &str = "create";

const MAX_SLUG_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub publish_at: DateTime<Utc>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// New post stamped with `now` as both creation and update time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        author_id: Uuid,
        slug: String,
        title: String,
        body: String,
        publish_at: DateTime<Utc>,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            slug,
            title,
            body,
            publish_at,
            is_private,
            created_at: now,
            updated_at: now,
        }
    }
}

impl AsRef<Post> for Post {
    fn as_ref(&self) -> &Post {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub id: Uuid,
    pub post_id: Uuid,
    pub url: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Thumbnail {
    pub id: Uuid,
    pub post_id: Uuid,
    pub url: String,
}

/// A post together with its tags, images and thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
    pub images: Vec<Image>,
    pub thumbnail: Option<Thumbnail>,
}

impl AsRef<Post> for PostDetail {
    fn as_ref(&self) -> &Post {
        &self.post
    }
}

/// Validated author input for creating or replacing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub publish_at: Option<DateTime<Utc>>,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub thumbnail_url: Option<String>,
}

impl PostDraft {
    /// Attaches the draft's tags, images and thumbnail to `post`.
    pub fn attach_to(self, post: Post) -> PostDetail {
        let post_id = post.id;
        let images = self
            .images
            .into_iter()
            .enumerate()
            .map(|(position, url)| Image {
                id: Uuid::new_v4(),
                post_id,
                url,
                position: position as i32,
            })
            .collect();
        let thumbnail = self.thumbnail_url.map(|url| Thumbnail {
            id: Uuid::new_v4(),
            post_id,
            url,
        });

        PostDetail {
            post,
            tags: self.tags.into_iter().map(Tag::new).collect(),
            images,
            thumbnail,
        }
    }
}

/// Lowercase ASCII slug: alphanumeric runs joined by single hyphens.
/// Returns an empty string when the title has no ASCII alphanumerics.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LEN));
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

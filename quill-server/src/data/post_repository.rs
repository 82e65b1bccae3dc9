use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::{Image, Post, PostDetail, Tag, Thumbnail};

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Fails with `SlugTaken` when the author already uses the slug.
    async fn create(&self, post: PostDetail) -> Result<PostDetail, DomainError>;
    /// Replaces the post's fields and all of its tags, images and thumbnail.
    /// Returns `None` when no post with that id belongs to the author.
    async fn update(&self, post: PostDetail) -> Result<Option<PostDetail>, DomainError>;
    async fn delete(&self, author_id: Uuid, post_id: Uuid) -> Result<bool, DomainError>;
    async fn find_by_author_and_slug(
        &self,
        author_id: Uuid,
        slug: &str,
    ) -> Result<Option<PostDetail>, DomainError>;
    /// Newest `publish_at` first. Visibility is not applied here.
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, DomainError>;
    async fn slug_taken(&self, author_id: Uuid, slug: &str) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        error!("{}: {}", context, e);
        DomainError::Internal(format!("database error: {}", e))
    }
}

/// Writes tags, images and thumbnail for `post`, returning the stored tags
/// (existing tags keep their ids).
async fn insert_children(conn: &mut PgConnection, post: &PostDetail) -> Result<Vec<Tag>, sqlx::Error> {
    let post_id = post.post.id;
    let mut tags = Vec::with_capacity(post.tags.len());

    for tag in &post.tags {
        let stored = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(tag.id)
        .bind(&tag.name)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(post_id)
            .bind(stored.id)
            .execute(&mut *conn)
            .await?;
        tags.push(stored);
    }

    for image in &post.images {
        sqlx::query("INSERT INTO images (id, post_id, url, position) VALUES ($1, $2, $3, $4)")
            .bind(image.id)
            .bind(post_id)
            .bind(&image.url)
            .bind(image.position)
            .execute(&mut *conn)
            .await?;
    }

    if let Some(thumbnail) = &post.thumbnail {
        sqlx::query("INSERT INTO thumbnails (id, post_id, url) VALUES ($1, $2, $3)")
            .bind(thumbnail.id)
            .bind(post_id)
            .bind(&thumbnail.url)
            .execute(&mut *conn)
            .await?;
    }

    Ok(tags)
}

async fn delete_children(conn: &mut PgConnection, post_id: Uuid) -> Result<(), sqlx::Error> {
    for statement in [
        "DELETE FROM post_tags WHERE post_id = $1",
        "DELETE FROM images WHERE post_id = $1",
        "DELETE FROM thumbnails WHERE post_id = $1",
    ] {
        sqlx::query(statement).bind(post_id).execute(&mut *conn).await?;
    }
    Ok(())
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: PostDetail) -> Result<PostDetail, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("failed to begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, slug, title, body, publish_at, is_private, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(post.post.id)
        .bind(post.post.author_id)
        .bind(&post.post.slug)
        .bind(&post.post.title)
        .bind(&post.post.body)
        .bind(post.post.publish_at)
        .bind(post.post.is_private)
        .bind(post.post.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let slug_clash = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .is_some_and(|c| c.contains("slug"));
            if slug_clash {
                DomainError::SlugTaken
            } else {
                db_error("failed to create post")(e)
            }
        })?;

        let tags = insert_children(&mut *tx, &post)
            .await
            .map_err(db_error("failed to store post attachments"))?;
        tx.commit().await.map_err(db_error("failed to commit post"))?;

        info!(post_id = %post.post.id, author_id = %post.post.author_id, "post created");
        Ok(PostDetail { tags, ..post })
    }

    async fn update(&self, post: PostDetail) -> Result<Option<PostDetail>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("failed to begin transaction"))?;

        let updated = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $1, body = $2, publish_at = $3, is_private = $4, updated_at = $5
            WHERE id = $6 AND author_id = $7
            RETURNING id, author_id, slug, title, body, publish_at, is_private, created_at, updated_at
            "#,
        )
        .bind(&post.post.title)
        .bind(&post.post.body)
        .bind(post.post.publish_at)
        .bind(post.post.is_private)
        .bind(post.post.updated_at)
        .bind(post.post.id)
        .bind(post.post.author_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("failed to update post"))?;

        let Some(updated) = updated else {
            return Ok(None);
        };

        delete_children(&mut *tx, updated.id)
            .await
            .map_err(db_error("failed to clear post attachments"))?;
        let tags = insert_children(&mut *tx, &post)
            .await
            .map_err(db_error("failed to store post attachments"))?;
        tx.commit().await.map_err(db_error("failed to commit post"))?;

        info!(post_id = %updated.id, "post updated");
        Ok(Some(PostDetail {
            post: updated,
            tags,
            ..post
        }))
    }

    async fn delete(&self, author_id: Uuid, post_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("failed to delete post"))?;

        let found = deleted.rows_affected() > 0;
        if found {
            info!(post_id = %post_id, "post deleted");
        }
        Ok(found)
    }

    async fn find_by_author_and_slug(
        &self,
        author_id: Uuid,
        slug: &str,
    ) -> Result<Option<PostDetail>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, slug, title, body, publish_at, is_private, created_at, updated_at
            FROM posts
            WHERE author_id = $1 AND slug = $2
            "#,
        )
        .bind(author_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to find post"))?;

        let Some(post) = post else {
            return Ok(None);
        };

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN post_tags pt ON pt.tag_id = t.id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(post.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to load post tags"))?;

        let images = sqlx::query_as::<_, Image>(
            "SELECT id, post_id, url, position FROM images WHERE post_id = $1 ORDER BY position",
        )
        .bind(post.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to load post images"))?;

        let thumbnail = sqlx::query_as::<_, Thumbnail>(
            "SELECT id, post_id, url FROM thumbnails WHERE post_id = $1",
        )
        .bind(post.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to load post thumbnail"))?;

        Ok(Some(PostDetail {
            post,
            tags,
            images,
            thumbnail,
        }))
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, slug, title, body, publish_at, is_private, created_at, updated_at
            FROM posts
            WHERE author_id = $1
            ORDER BY publish_at DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to list posts"))
    }

    async fn slug_taken(&self, author_id: Uuid, slug: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE author_id = $1 AND slug = $2)")
            .bind(author_id)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("failed to check slug"))
    }
}

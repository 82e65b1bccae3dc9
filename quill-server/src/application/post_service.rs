use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostDetail, PostDraft, RESERVED_SLUG, slugify};
use crate::domain::user::User;
use crate::domain::viewer::{AuthenticatedUser, Viewer};
use crate::domain::visibility::{ShowDecision, authorize_show, can_manage, can_view};

/// A user's page as seen by one viewer.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub posts: Vec<Post>,
    pub owner_affordances: bool,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    pub async fn author(&self, screen_name: &str) -> Result<User, DomainError> {
        self.users
            .find_by_screen_name(screen_name)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn profile(
        &self,
        screen_name: &str,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> Result<Profile, DomainError> {
        let user = self.author(screen_name).await?;
        let posts = self
            .posts
            .list_by_author(user.id)
            .await?
            .into_iter()
            .filter(|post| can_view(post, viewer, now))
            .collect();

        Ok(Profile {
            owner_affordances: viewer.is(user.id),
            user,
            posts,
        })
    }

    /// Missing authors and missing posts surface as `DomainError::NotFound`;
    /// everything else is decided by the visibility gate.
    pub async fn show(
        &self,
        screen_name: &str,
        slug: &str,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> Result<ShowDecision<PostDetail>, DomainError> {
        let author = self.author(screen_name).await?;
        let post = self
            .posts
            .find_by_author_and_slug(author.id, slug)
            .await?
            .ok_or(DomainError::NotFound)?;

        let decision = authorize_show(post, viewer, now);
        debug!(
            slug,
            decision = match &decision {
                ShowDecision::Render { .. } => "render",
                ShowDecision::NotFound => "not_found",
                ShowDecision::RedirectToEdit => "redirect_to_edit",
            },
            "show decision"
        );
        Ok(decision)
    }

    /// Loads a post for editing. Posts the user does not own are reported as
    /// missing.
    pub async fn managed(
        &self,
        screen_name: &str,
        slug: &str,
        user: &AuthenticatedUser,
    ) -> Result<PostDetail, DomainError> {
        let author = self.author(screen_name).await?;
        let post = self
            .posts
            .find_by_author_and_slug(author.id, slug)
            .await?
            .ok_or(DomainError::NotFound)?;

        if can_manage(&post.post, &Viewer::User(user.clone())) {
            Ok(post)
        } else {
            Err(DomainError::NotFound)
        }
    }

    #[instrument(skip(self, author, draft), fields(author = %author.screen_name))]
    pub async fn create_post(
        &self,
        author: &AuthenticatedUser,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Result<PostDetail, DomainError> {
        let id = Uuid::new_v4();
        let slug = self.unique_slug(author.id, &draft.title, id).await?;
        let post = Post::new(
            id,
            author.id,
            slug,
            draft.title.clone(),
            draft.body.clone(),
            draft.publish_at.unwrap_or(now),
            draft.is_private,
            now,
        );

        // Another request can claim the slug between the check and the insert.
        match self.posts.create(draft.clone().attach_to(post.clone())).await {
            Err(DomainError::SlugTaken) => {
                let slug = format!("{}-{}", post.slug, slug_suffix(id));
                warn!(%slug, "slug claimed concurrently, retrying with suffix");
                self.posts.create(draft.attach_to(Post { slug, ..post })).await
            }
            result => result,
        }
    }

    #[instrument(skip(self, current, draft), fields(post_id = %current.post.id))]
    pub async fn update_post(
        &self,
        current: PostDetail,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Result<PostDetail, DomainError> {
        let post = Post {
            title: draft.title.clone(),
            body: draft.body.clone(),
            publish_at: draft.publish_at.unwrap_or(now),
            is_private: draft.is_private,
            updated_at: now,
            ..current.post
        };
        self.posts
            .update(draft.attach_to(post))
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self, post), fields(post_id = %post.id))]
    pub async fn delete_post(&self, post: &Post) -> Result<(), DomainError> {
        if self.posts.delete(post.author_id, post.id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    async fn unique_slug(&self, author_id: Uuid, title: &str, id: Uuid) -> Result<String, DomainError> {
        let suffix = slug_suffix(id);
        let base = slugify(title);
        if base.is_empty() {
            return Ok(suffix);
        }
        if base != RESERVED_SLUG && !self.posts.slug_taken(author_id, &base).await? {
            return Ok(base);
        }
        Ok(format!("{base}-{suffix}"))
    }
}

fn slug_suffix(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::{InMemoryPostRepository, InMemoryUserRepository};
    use chrono::{Duration, TimeZone};

    struct Setup {
        service: PostService,
        alice: AuthenticatedUser,
        bob: AuthenticatedUser,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    async fn setup() -> Setup {
        let users = Arc::new(InMemoryUserRepository::new());
        let mut named = Vec::new();
        for name in ["alice", "bob"] {
            let user = users
                .create(User::new(name.into(), format!("{name}@example.com"), "hash".into()))
                .await
                .unwrap();
            named.push(AuthenticatedUser {
                id: user.id,
                screen_name: user.screen_name,
            });
        }
        let bob = named.pop().unwrap();
        let alice = named.pop().unwrap();
        Setup {
            service: PostService::new(Arc::new(InMemoryPostRepository::new()), users),
            alice,
            bob,
        }
    }

    fn draft(title: &str, publish_at: DateTime<Utc>, is_private: bool) -> PostDraft {
        PostDraft {
            title: title.into(),
            body: format!("{title} body"),
            publish_at: Some(publish_at),
            is_private,
            tags: vec!["rust".into()],
            images: vec![],
            thumbnail_url: None,
        }
    }

    #[tokio::test]
    async fn profile_lists_only_visible_posts_for_others() {
        let s = setup().await;
        let past = now() - Duration::days(1);
        let future = now() + Duration::days(1);
        s.service.create_post(&s.alice, draft("Open", past, false), now()).await.unwrap();
        s.service.create_post(&s.alice, draft("Hidden", future, true), now()).await.unwrap();
        s.service.create_post(&s.bob, draft("Bobs", past, false), now()).await.unwrap();

        let titles = |profile: Profile| -> Vec<String> {
            profile.posts.into_iter().map(|p| p.title).collect()
        };

        let anonymous = s.service.profile("alice", &Viewer::Anonymous, now()).await.unwrap();
        assert!(!anonymous.owner_affordances);
        assert_eq!(titles(anonymous), ["Open"]);

        let owner = s
            .service
            .profile("alice", &Viewer::User(s.alice.clone()), now())
            .await
            .unwrap();
        assert!(owner.owner_affordances);
        assert_eq!(titles(owner), ["Hidden", "Open"]);
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let s = setup().await;
        let result = s.service.profile("nobody", &Viewer::Anonymous, now()).await;
        assert!(matches!(result, Err(DomainError::NotFound)));
        let result = s.service.show("nobody", "x", &Viewer::Anonymous, now()).await;
        assert!(matches!(result, Err(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn slugs_are_disambiguated_per_author() {
        let s = setup().await;
        let past = now() - Duration::days(1);
        let first = s.service.create_post(&s.alice, draft("Hello World", past, false), now()).await.unwrap();
        let second = s.service.create_post(&s.alice, draft("Hello world!", past, false), now()).await.unwrap();
        let bobs = s.service.create_post(&s.bob, draft("Hello World", past, false), now()).await.unwrap();
        let reserved = s.service.create_post(&s.alice, draft("Create", past, false), now()).await.unwrap();
        let untitled = s.service.create_post(&s.alice, draft("日記", past, false), now()).await.unwrap();

        assert_eq!(first.post.slug, "hello-world");
        assert!(second.post.slug.starts_with("hello-world-"));
        assert_eq!(bobs.post.slug, "hello-world");
        assert!(reserved.post.slug.starts_with("create-"));
        assert_eq!(untitled.post.slug.len(), 8);
    }

    /// Repository that never sees a slug as taken, so clashes only surface
    /// at insert time, like two requests racing for the same title.
    struct RacingSlugs(InMemoryPostRepository);

    #[async_trait::async_trait]
    impl PostRepository for RacingSlugs {
        async fn create(&self, post: PostDetail) -> Result<PostDetail, DomainError> {
            self.0.create(post).await
        }
        async fn update(&self, post: PostDetail) -> Result<Option<PostDetail>, DomainError> {
            self.0.update(post).await
        }
        async fn delete(&self, author_id: Uuid, post_id: Uuid) -> Result<bool, DomainError> {
            self.0.delete(author_id, post_id).await
        }
        async fn find_by_author_and_slug(
            &self,
            author_id: Uuid,
            slug: &str,
        ) -> Result<Option<PostDetail>, DomainError> {
            self.0.find_by_author_and_slug(author_id, slug).await
        }
        async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, DomainError> {
            self.0.list_by_author(author_id).await
        }
        async fn slug_taken(&self, _author_id: Uuid, _slug: &str) -> Result<bool, DomainError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn slug_clash_at_insert_falls_back_to_suffix() {
        let s = setup().await;
        let service = PostService::new(
            Arc::new(RacingSlugs(InMemoryPostRepository::new())),
            Arc::clone(&s.service.users),
        );
        let past = now() - Duration::days(1);

        let first = service.create_post(&s.alice, draft("Same Title", past, false), now()).await.unwrap();
        let second = service.create_post(&s.alice, draft("Same Title", past, false), now()).await.unwrap();

        assert_eq!(first.post.slug, "same-title");
        assert_eq!(
            second.post.slug,
            format!("same-title-{}", slug_suffix(second.post.id))
        );
        assert_eq!(service.profile("alice", &Viewer::Anonymous, now()).await.unwrap().posts.len(), 2);
    }

    #[tokio::test]
    async fn missing_publish_date_defaults_to_now() {
        let s = setup().await;
        let mut d = draft("Now", now(), false);
        d.publish_at = None;
        let created = s.service.create_post(&s.alice, d, now()).await.unwrap();
        assert_eq!(created.post.publish_at, now());
    }

    #[tokio::test]
    async fn bookkeeping_times_follow_the_request_clock() {
        let s = setup().await;
        let past = now() - Duration::days(1);
        let created = s.service.create_post(&s.alice, draft("Stamped", past, false), now()).await.unwrap();
        assert_eq!(created.post.created_at, now());
        assert_eq!(created.post.updated_at, now());

        let later = now() + Duration::hours(2);
        let updated = s
            .service
            .update_post(created, draft("Stamped again", past, false), later)
            .await
            .unwrap();
        assert_eq!(updated.post.created_at, now());
        assert_eq!(updated.post.updated_at, later);
    }

    #[tokio::test]
    async fn show_applies_the_gate() {
        let s = setup().await;
        let future = now() + Duration::days(1);
        let post = s.service.create_post(&s.alice, draft("Soon", future, false), now()).await.unwrap();

        let stranger = s
            .service
            .show("alice", &post.post.slug, &Viewer::User(s.bob.clone()), now())
            .await
            .unwrap();
        assert_eq!(stranger, ShowDecision::NotFound);

        let owner = s
            .service
            .show("alice", &post.post.slug, &Viewer::User(s.alice.clone()), now())
            .await
            .unwrap();
        assert_eq!(owner, ShowDecision::RedirectToEdit);

        let later = s
            .service
            .show("alice", &post.post.slug, &Viewer::Anonymous, future)
            .await
            .unwrap();
        assert!(matches!(later, ShowDecision::Render { owner_affordances: false, .. }));
    }

    #[tokio::test]
    async fn only_the_owner_can_load_update_or_delete() {
        let s = setup().await;
        let past = now() - Duration::days(1);
        let post = s.service.create_post(&s.alice, draft("Mine", past, false), now()).await.unwrap();

        let as_bob = s.service.managed("alice", "mine", &s.bob).await;
        assert!(matches!(as_bob, Err(DomainError::NotFound)));

        let current = s.service.managed("alice", "mine", &s.alice).await.unwrap();
        let updated = s
            .service
            .update_post(current, draft("Mine, edited", past, true), now())
            .await
            .unwrap();
        assert_eq!(updated.post.slug, "mine");
        assert!(updated.post.is_private);

        s.service.delete_post(&post.post).await.unwrap();
        assert!(matches!(
            s.service.delete_post(&post.post).await,
            Err(DomainError::NotFound)
        ));
    }
}

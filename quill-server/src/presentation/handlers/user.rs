use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde_json::json;
use tera::Context;
use tracing::info;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::viewer::Viewer;
use crate::infrastructure::clock::Clock;
use crate::presentation::middleware::request_id;
use crate::presentation::paths;
use crate::presentation::views::{PostSummary, View, Views};

#[get("/users/{screen_name}")]
pub async fn profile(
    req: HttpRequest,
    viewer: Viewer,
    posts: web::Data<PostService>,
    views: web::Data<Views>,
    clock: web::Data<Arc<dyn Clock>>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let screen_name = path.into_inner();
    let now = clock.now();
    let profile = posts.profile(&screen_name, &viewer, now).await?;

    let name = profile.user.screen_name.as_str();
    let summaries: Vec<PostSummary> = profile
        .posts
        .iter()
        .map(|post| PostSummary::new(name, post, now))
        .collect();

    info!(
        request_id = %request_id(&req),
        screen_name = %name,
        listed = summaries.len(),
        "profile rendered"
    );

    let mut context = Context::new();
    context.insert("profile", &json!({ "screen_name": name }));
    context.insert("posts", &summaries);
    context.insert("owner_affordances", &profile.owner_affordances);
    context.insert("create_url", &paths::create_post(name));
    views.page(StatusCode::OK, View::User, &viewer, context)
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::Duration;

    use crate::test_support::Fixture;

    #[actix_web::test]
    async fn visitors_see_only_published_public_posts_of_that_user() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        fx.post(&alice, "Open post", fx.now - Duration::days(1), false).await;
        fx.post(&alice, "Hidden post", fx.now + Duration::days(1), true).await;
        fx.post(&bob, "Post by bob", fx.now - Duration::days(1), false).await;
        let app = test::init_service(App::new().configure(|cfg| fx.state.configure(cfg))).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/users/alice").to_request()).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = Fixture::body(res).await;
        assert!(body.contains("data-view=\"user\""));
        assert!(body.contains("Open post"));
        assert!(!body.contains("Hidden post"));
        assert!(!body.contains("Post by bob"));
        assert!(!body.contains("class=\"new-post\""));
    }

    #[actix_web::test]
    async fn owner_sees_own_private_and_scheduled_posts() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        fx.post(&alice, "Hidden post", fx.now + Duration::days(1), true).await;
        let app = test::init_service(App::new().configure(|cfg| fx.state.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/users/alice")
            .cookie(fx.session(&alice))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = Fixture::body(res).await;
        assert!(body.contains("Hidden post"));
        assert!(body.contains("class=\"new-post\""));
    }

    #[actix_web::test]
    async fn unknown_user_is_not_found() {
        let fx = Fixture::new();
        let app = test::init_service(App::new().configure(|cfg| fx.state.configure(cfg))).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/users/ghost").to_request()).await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}

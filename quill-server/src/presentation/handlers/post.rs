use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tera::Context;
use tracing::info;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::viewer::{AuthenticatedUser, Viewer};
use crate::domain::visibility::{ManageDecision, ShowDecision, authorize_manage};
use crate::infrastructure::clock::Clock;
use crate::presentation::dto::PostForm;
use crate::presentation::handlers::redirect;
use crate::presentation::middleware::request_id;
use crate::presentation::paths;
use crate::presentation::views::{PostPage, View, Views};

/// Signed-in user for the create and edit screens, or the login redirect.
fn manager(viewer: &Viewer) -> Result<AuthenticatedUser, HttpResponse> {
    match authorize_manage(viewer) {
        ManageDecision::Proceed(user) => Ok(user),
        ManageDecision::RedirectToLogin => Err(redirect(paths::LOGIN)),
    }
}

/// Only the profile owner, matched by id, may write posts under their name.
async fn ensure_profile_owner(
    posts: &PostService,
    screen_name: &str,
    user: &AuthenticatedUser,
) -> Result<(), DomainError> {
    let author = posts.author(screen_name).await?;
    if author.id == user.id {
        Ok(())
    } else {
        Err(DomainError::NotFound)
    }
}

struct Editor<'a> {
    heading: &'a str,
    action: String,
    show_url: Option<String>,
}

fn edit_page(
    views: &Views,
    viewer: &Viewer,
    status: StatusCode,
    editor: Editor<'_>,
    form: &PostForm,
    error: Option<&str>,
) -> Result<HttpResponse, DomainError> {
    let mut context = Context::new();
    context.insert("heading", editor.heading);
    context.insert("action", &editor.action);
    context.insert("form", form);
    if let Some(show_url) = &editor.show_url {
        context.insert("show_url", show_url);
    }
    if let Some(error) = error {
        context.insert("error", error);
    }
    views.page(status, View::Edit, viewer, context)
}

#[get("/users/{screen_name}/posts/{slug}")]
pub async fn show_post(
    req: HttpRequest,
    viewer: Viewer,
    posts: web::Data<PostService>,
    views: web::Data<Views>,
    clock: web::Data<Arc<dyn Clock>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, DomainError> {
    let (screen_name, slug) = path.into_inner();
    let now = clock.now();

    match posts.show(&screen_name, &slug, &viewer, now).await? {
        ShowDecision::NotFound => Err(DomainError::NotFound),
        ShowDecision::RedirectToEdit => Ok(redirect(&paths::edit_post(&screen_name, &slug))),
        ShowDecision::Render {
            post,
            owner_affordances,
        } => {
            info!(
                request_id = %request_id(&req),
                post_id = %post.post.id,
                owner_affordances,
                "post rendered"
            );
            let mut context = Context::new();
            context.insert("post", &PostPage::new(&screen_name, &post));
            context.insert("author", &screen_name);
            context.insert("owner_affordances", &owner_affordances);
            views.page(StatusCode::OK, View::Post, &viewer, context)
        }
    }
}

#[get("/users/{screen_name}/posts/create")]
pub async fn create_post_page(
    viewer: Viewer,
    posts: web::Data<PostService>,
    views: web::Data<Views>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let screen_name = path.into_inner();
    let user = match manager(&viewer) {
        Ok(user) => user,
        Err(to_login) => return Ok(to_login),
    };
    ensure_profile_owner(&posts, &screen_name, &user).await?;

    let editor = Editor {
        heading: "New post",
        action: paths::store_post(&screen_name),
        show_url: None,
    };
    edit_page(&views, &viewer, StatusCode::OK, editor, &PostForm::default(), None)
}

#[post("/users/{screen_name}/posts")]
pub async fn store_post(
    req: HttpRequest,
    viewer: Viewer,
    posts: web::Data<PostService>,
    views: web::Data<Views>,
    clock: web::Data<Arc<dyn Clock>>,
    path: web::Path<String>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let screen_name = path.into_inner();
    let user = match manager(&viewer) {
        Ok(user) => user,
        Err(to_login) => return Ok(to_login),
    };
    ensure_profile_owner(&posts, &screen_name, &user).await?;

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(DomainError::Validation(message)) => {
            let editor = Editor {
                heading: "New post",
                action: paths::store_post(&screen_name),
                show_url: None,
            };
            return edit_page(
                &views,
                &viewer,
                StatusCode::UNPROCESSABLE_ENTITY,
                editor,
                &form,
                Some(&message),
            );
        }
        Err(err) => return Err(err),
    };

    let created = posts.create_post(&user, draft, clock.now()).await?;
    info!(
        request_id = %request_id(&req),
        username = %user.screen_name,
        post_id = %created.post.id,
        "post created"
    );
    Ok(redirect(&paths::show_post(&screen_name, &created.post.slug)))
}

#[get("/users/{screen_name}/posts/{slug}/edit")]
pub async fn edit_post_page(
    viewer: Viewer,
    posts: web::Data<PostService>,
    views: web::Data<Views>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, DomainError> {
    let (screen_name, slug) = path.into_inner();
    let user = match manager(&viewer) {
        Ok(user) => user,
        Err(to_login) => return Ok(to_login),
    };
    let current = posts.managed(&screen_name, &slug, &user).await?;

    let editor = Editor {
        heading: "Edit post",
        action: paths::show_post(&screen_name, &slug),
        show_url: Some(paths::show_post(&screen_name, &slug)),
    };
    edit_page(
        &views,
        &viewer,
        StatusCode::OK,
        editor,
        &PostForm::from_detail(&current),
        None,
    )
}

#[post("/users/{screen_name}/posts/{slug}")]
pub async fn update_post(
    req: HttpRequest,
    viewer: Viewer,
    posts: web::Data<PostService>,
    views: web::Data<Views>,
    clock: web::Data<Arc<dyn Clock>>,
    path: web::Path<(String, String)>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let (screen_name, slug) = path.into_inner();
    let user = match manager(&viewer) {
        Ok(user) => user,
        Err(to_login) => return Ok(to_login),
    };
    let current = posts.managed(&screen_name, &slug, &user).await?;

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(DomainError::Validation(message)) => {
            let editor = Editor {
                heading: "Edit post",
                action: paths::show_post(&screen_name, &slug),
                show_url: Some(paths::show_post(&screen_name, &slug)),
            };
            return edit_page(
                &views,
                &viewer,
                StatusCode::UNPROCESSABLE_ENTITY,
                editor,
                &form,
                Some(&message),
            );
        }
        Err(err) => return Err(err),
    };

    let updated = posts.update_post(current, draft, clock.now()).await?;
    info!(
        request_id = %request_id(&req),
        username = %user.screen_name,
        post_id = %updated.post.id,
        "post updated"
    );
    Ok(redirect(&paths::show_post(&screen_name, &updated.post.slug)))
}

#[post("/users/{screen_name}/posts/{slug}/delete")]
pub async fn delete_post(
    req: HttpRequest,
    viewer: Viewer,
    posts: web::Data<PostService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, DomainError> {
    let (screen_name, slug) = path.into_inner();
    let user = match manager(&viewer) {
        Ok(user) => user,
        Err(to_login) => return Ok(to_login),
    };
    let current = posts.managed(&screen_name, &slug, &user).await?;
    posts.delete_post(&current.post).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.screen_name,
        post_id = %current.post.id,
        "post deleted"
    );
    Ok(redirect(&paths::profile(&screen_name)))
}

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, ResponseError, get, post, web};
use tera::Context;
use tracing::info;

use crate::application::auth_service::{AuthService, Session};
use crate::domain::error::DomainError;
use crate::domain::viewer::Viewer;
use crate::presentation::dto::{LoginForm, RegisterForm};
use crate::presentation::handlers::redirect;
use crate::presentation::middleware::request_id;
use crate::presentation::paths;
use crate::presentation::viewer::SessionCookie;
use crate::presentation::views::{View, Views};

/// Where a viewer lands after signing in: their own page, or the site root when
/// nobody is signed in.
pub fn redirect_path(viewer: &Viewer) -> String {
    match viewer.user() {
        Some(user) => paths::profile(&user.screen_name),
        None => paths::HOME.to_string(),
    }
}

fn signed_in(session: Session, cookie: &SessionCookie) -> HttpResponse {
    let location = redirect_path(&Viewer::User(session.user));
    HttpResponse::Found()
        .cookie(cookie.issue(session.token))
        .append_header((header::LOCATION, location))
        .finish()
}

fn form_context<T: serde::Serialize>(form: &T, error: Option<&str>) -> Context {
    let mut context = Context::new();
    context.insert("form", form);
    if let Some(error) = error {
        context.insert("error", error);
    }
    context
}

#[get("/")]
pub async fn home(viewer: Viewer) -> HttpResponse {
    match viewer {
        Viewer::User(_) => redirect(&redirect_path(&viewer)),
        Viewer::Anonymous => redirect(paths::LOGIN),
    }
}

#[get("/login")]
pub async fn login_page(viewer: Viewer, views: web::Data<Views>) -> Result<HttpResponse, DomainError> {
    if viewer.user().is_some() {
        return Ok(redirect(&redirect_path(&viewer)));
    }
    views.page(
        StatusCode::OK,
        View::Login,
        &viewer,
        form_context(&LoginForm::default(), None),
    )
}

#[post("/login")]
pub async fn login(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    views: web::Data<Views>,
    cookie: web::Data<SessionCookie>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, DomainError> {
    match auth.login(form.screen_name.trim(), &form.password).await {
        Ok(session) => {
            info!(
                request_id = %request_id(&req),
                screen_name = %session.user.screen_name,
                "user logged in"
            );
            Ok(signed_in(session, &cookie))
        }
        Err(DomainError::InvalidCredentials) => views.page(
            StatusCode::UNPROCESSABLE_ENTITY,
            View::Login,
            &Viewer::Anonymous,
            form_context(&form.0, Some("These credentials do not match our records.")),
        ),
        Err(err) => Err(err),
    }
}

#[post("/logout")]
pub async fn logout(req: HttpRequest, viewer: Viewer, cookie: web::Data<SessionCookie>) -> HttpResponse {
    if let Some(user) = viewer.user() {
        info!(request_id = %request_id(&req), screen_name = %user.screen_name, "user logged out");
    }
    HttpResponse::Found()
        .cookie(cookie.clear())
        .append_header((header::LOCATION, paths::LOGIN))
        .finish()
}

#[get("/register")]
pub async fn register_page(viewer: Viewer, views: web::Data<Views>) -> Result<HttpResponse, DomainError> {
    if viewer.user().is_some() {
        return Ok(redirect(&redirect_path(&viewer)));
    }
    views.page(
        StatusCode::OK,
        View::Register,
        &viewer,
        form_context(&RegisterForm::default(), None),
    )
}

#[post("/register")]
pub async fn register(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    views: web::Data<Views>,
    cookie: web::Data<SessionCookie>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    let result = match form.validate() {
        Ok(()) => auth.register(&form.screen_name, form.email.trim(), &form.password).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(session) => {
            info!(
                request_id = %request_id(&req),
                user_id = %session.user.id,
                screen_name = %session.user.screen_name,
                "user registered"
            );
            Ok(signed_in(session, &cookie))
        }
        Err(err) => {
            let status = err.status_code();
            match err {
                DomainError::Validation(message) | DomainError::Conflict(message) => views.page(
                    status,
                    View::Register,
                    &Viewer::Anonymous,
                    form_context(&form, Some(&message)),
                ),
                other => Err(other),
            }
        }
    }
}

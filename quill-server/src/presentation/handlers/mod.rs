use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web::web::ServiceConfig;

use crate::domain::error::DomainError;

pub mod auth;
pub mod health;
pub mod post;
pub mod user;

/// Registers every route. The create-post page comes before the show-post
/// route so that `create` is never taken for a slug.
pub fn routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health)
        .service(auth::home)
        .service(auth::login_page)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::register_page)
        .service(auth::register)
        .service(user::profile)
        .service(post::create_post_page)
        .service(post::store_post)
        .service(post::edit_post_page)
        .service(post::delete_post)
        .service(post::show_post)
        .service(post::update_post);
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

pub async fn not_found() -> Result<HttpResponse, DomainError> {
    Err(DomainError::NotFound)
}

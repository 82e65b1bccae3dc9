use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpRequest, error::ErrorInternalServerError, web};
use tracing::{debug, error};

use crate::domain::viewer::{AuthenticatedUser, Viewer};
use crate::infrastructure::security::JwtKeys;

/// Turns an incoming request into the identity that visibility rules see.
pub trait ViewerResolver: Send + Sync {
    fn resolve(&self, req: &HttpRequest) -> Viewer;
}

/// Settings for the cookie carrying the session token.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub ttl_hours: i64,
}

impl SessionCookie {
    pub fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build(self.name.clone(), token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(CookieDuration::hours(self.ttl_hours))
            .finish()
    }

    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.name.clone(), "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// Reads the session token from the session cookie, falling back to a
/// `Bearer` authorization header. Anything missing or invalid is anonymous.
#[derive(Clone)]
pub struct SessionResolver {
    keys: JwtKeys,
    cookie_name: String,
}

impl SessionResolver {
    pub fn new(keys: JwtKeys, cookie_name: String) -> Self {
        Self { keys, cookie_name }
    }

    fn token(&self, req: &HttpRequest) -> Option<String> {
        if let Some(cookie) = req.cookie(&self.cookie_name) {
            return Some(cookie.value().to_owned());
        }
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned)
    }
}

impl ViewerResolver for SessionResolver {
    fn resolve(&self, req: &HttpRequest) -> Viewer {
        let Some(token) = self.token(req) else {
            return Viewer::Anonymous;
        };

        match self
            .keys
            .verify_token(&token)
            .map_err(|e| e.to_string())
            .and_then(|claims| AuthenticatedUser::try_from(claims).map_err(|e| e.to_string()))
        {
            Ok(user) => Viewer::User(user),
            Err(reason) => {
                debug!(%reason, "ignoring invalid session");
                Viewer::Anonymous
            }
        }
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.app_data::<web::Data<Arc<dyn ViewerResolver>>>() {
            Some(resolver) => ready(Ok(resolver.resolve(req))),
            None => {
                error!("ViewerResolver missing from app data");
                ready(Err(ErrorInternalServerError("viewer resolver missing")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Duration;
    use uuid::Uuid;

    fn resolver() -> SessionResolver {
        SessionResolver::new(JwtKeys::new("secret".into(), Duration::hours(1)), "session".into())
    }

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            screen_name: "alice".into(),
        }
    }

    #[test]
    fn no_credentials_means_anonymous() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(resolver().resolve(&req), Viewer::Anonymous);
    }

    #[test]
    fn garbage_cookie_means_anonymous() {
        let req = TestRequest::default()
            .cookie(Cookie::new("session", "garbage"))
            .to_http_request();
        assert_eq!(resolver().resolve(&req), Viewer::Anonymous);
    }

    #[test]
    fn session_cookie_resolves_user() {
        let resolver = resolver();
        let user = alice();
        let token = resolver.keys.generate_token(&user).unwrap();
        let req = TestRequest::default()
            .cookie(Cookie::new("session", token))
            .to_http_request();
        assert_eq!(resolver.resolve(&req), Viewer::User(user));
    }

    #[test]
    fn bearer_header_resolves_user() {
        let resolver = resolver();
        let user = alice();
        let token = resolver.keys.generate_token(&user).unwrap();
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();
        assert_eq!(resolver.resolve(&req), Viewer::User(user));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let session = SessionCookie {
            name: "session".into(),
            secure: true,
            ttl_hours: 24,
        };
        let issued = session.issue("token".into());
        assert_eq!(issued.http_only(), Some(true));
        assert_eq!(issued.secure(), Some(true));

        let cleared = session.clear();
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(CookieDuration::ZERO));
    }
}

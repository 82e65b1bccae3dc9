use std::sync::Arc;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tera::{Context, Tera};

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostDetail};
use crate::domain::viewer::Viewer;
use crate::presentation::paths;

const TEMPLATES: [(&str, &str); 6] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("user.html", include_str!("../../templates/user.html")),
    ("post.html", include_str!("../../templates/post.html")),
    ("edit.html", include_str!("../../templates/edit.html")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    User,
    Post,
    Edit,
}

impl View {
    pub fn template(self) -> &'static str {
        match self {
            View::Login => "login.html",
            View::Register => "register.html",
            View::User => "user.html",
            View::Post => "post.html",
            View::Edit => "edit.html",
        }
    }
}

/// Templates compiled into the binary.
#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
}

impl Views {
    pub fn load() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape_html);
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, view: View, viewer: &Viewer, mut context: Context) -> Result<String, DomainError> {
        context.insert("viewer", &viewer.user());
        if let Some(user) = viewer.user() {
            context.insert("viewer_profile_url", &paths::profile(&user.screen_name));
        }
        Ok(self.tera.render(view.template(), &context)?)
    }

    pub fn page(
        &self,
        status: StatusCode,
        view: View,
        viewer: &Viewer,
        context: Context,
    ) -> Result<HttpResponse, DomainError> {
        let html = self.render(view, viewer, context)?;
        Ok(HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(html))
    }
}

/// Row on a profile page.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub url: String,
    pub publish_at: String,
    pub is_private: bool,
    pub scheduled: bool,
}

impl PostSummary {
    pub fn new(screen_name: &str, post: &Post, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            title: post.title.clone(),
            url: paths::show_post(screen_name, &post.slug),
            publish_at: display_time(post.publish_at),
            is_private: post.is_private,
            scheduled: post.publish_at > now,
        }
    }
}

/// Everything the read view of a post needs.
#[derive(Debug, Serialize)]
pub struct PostPage {
    pub title: String,
    pub body: String,
    pub publish_at: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
    pub author_url: String,
    pub edit_url: String,
    pub delete_url: String,
}

impl PostPage {
    pub fn new(screen_name: &str, detail: &PostDetail) -> Self {
        let post = &detail.post;
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            publish_at: display_time(post.publish_at),
            tags: detail.tags.iter().map(|tag| tag.name.clone()).collect(),
            images: detail.images.iter().map(|image| image.url.clone()).collect(),
            thumbnail: detail.thumbnail.as_ref().map(|thumbnail| thumbnail.url.clone()),
            author_url: paths::profile(screen_name),
            edit_url: paths::edit_post(screen_name, &post.slug),
            delete_url: paths::delete_post(screen_name, &post.slug),
        }
    }
}

/// Like Tera's default escaping, minus `/`, so URLs stay readable in the markup.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn display_time(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

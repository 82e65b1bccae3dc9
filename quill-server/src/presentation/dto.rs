use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostDetail, PostDraft};

const MAX_TITLE_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;

// ======================= AUTH =======================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub screen_name: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let name = self.screen_name.as_str();
        if !(3..=32).contains(&name.len())
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::Validation(
                "screen name must be 3-32 letters, digits or underscores".into(),
            ));
        }
        if !self.email.contains('@') {
            return Err(DomainError::Validation("email address is invalid".into()));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

// ======================= POSTS =======================

/// Raw post form as submitted by the editor, also used to refill it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub publish_at: String,
    /// Checkbox: present (any value) when ticked.
    #[serde(default)]
    pub is_private: Option<String>,
    /// Comma separated.
    #[serde(default)]
    pub tags: String,
    /// One URL per line.
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl PostForm {
    pub fn from_detail(detail: &PostDetail) -> Self {
        let Post {
            title,
            body,
            publish_at,
            is_private,
            ..
        } = &detail.post;
        Self {
            title: title.clone(),
            body: body.clone(),
            publish_at: publish_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            is_private: is_private.then(|| "on".to_string()),
            tags: detail
                .tags
                .iter()
                .map(|tag| tag.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            images: detail
                .images
                .iter()
                .map(|image| image.url.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            thumbnail_url: detail
                .thumbnail
                .as_ref()
                .map(|thumbnail| thumbnail.url.clone())
                .unwrap_or_default(),
        }
    }

    pub fn to_draft(&self) -> Result<PostDraft, DomainError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation("title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if self.body.trim().is_empty() {
            return Err(DomainError::Validation("body is required".into()));
        }

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|known| known == tag) {
                tags.push(tag.to_string());
            }
        }

        let images = self
            .images
            .lines()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();

        let thumbnail_url = Some(self.thumbnail_url.trim())
            .filter(|url| !url.is_empty())
            .map(String::from);

        Ok(PostDraft {
            title: title.to_string(),
            body: self.body.clone(),
            publish_at: parse_publish_at(&self.publish_at)?,
            is_private: self.is_private.is_some(),
            tags,
            images,
            thumbnail_url,
        })
    }
}

/// Accepts RFC 3339 or the `datetime-local` input format, read as UTC.
fn parse_publish_at(raw: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }
    Err(DomainError::Validation(
        "publish date must look like 2024-05-01T12:00".into(),
    ))
}

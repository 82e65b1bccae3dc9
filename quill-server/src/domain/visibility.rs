//! Who may see a post, and who may manage it.
//!
//! Every function here is pure: the viewer and the current instant are passed in
//! by the caller, which samples the clock once per request.

use chrono::{DateTime, Utc};

use crate::domain::post::Post;
use crate::domain::viewer::{AuthenticatedUser, Viewer};

/// Outcome of a request to read a single post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowDecision<T> {
    Render { post: T, owner_affordances: bool },
    /// Must be answered exactly like a post that does not exist.
    NotFound,
    RedirectToEdit,
}

/// Outcome of a request to reach the create or edit screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageDecision {
    Proceed(AuthenticatedUser),
    RedirectToLogin,
}

/// Visible to everyone on its own merits: not private and already published.
pub fn is_public(post: &Post, now: DateTime<Utc>) -> bool {
    !post.is_private && now >= post.publish_at
}

pub fn can_view(post: &Post, viewer: &Viewer, now: DateTime<Utc>) -> bool {
    viewer.is(post.author_id) || is_public(post, now)
}

pub fn can_manage(post: &Post, viewer: &Viewer) -> bool {
    viewer.is(post.author_id)
}

/// Owners visiting their own unpublished or private post are sent to the editor
/// instead of the read view.
pub fn authorize_show<T: AsRef<Post>>(item: T, viewer: &Viewer, now: DateTime<Utc>) -> ShowDecision<T> {
    let (visible, owner, public) = {
        let post = item.as_ref();
        (
            can_view(post, viewer, now),
            can_manage(post, viewer),
            is_public(post, now),
        )
    };

    if !visible {
        ShowDecision::NotFound
    } else if owner && !public {
        ShowDecision::RedirectToEdit
    } else {
        ShowDecision::Render {
            post: item,
            owner_affordances: owner,
        }
    }
}

pub fn authorize_manage(viewer: &Viewer) -> ManageDecision {
    match viewer {
        Viewer::Anonymous => ManageDecision::RedirectToLogin,
        Viewer::User(user) => ManageDecision::Proceed(user.clone()),
    }
}

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub screen_name: String,
}

/// Identity of whoever issued the current request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(AuthenticatedUser),
}

impl Viewer {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(user) => Some(user),
        }
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user().is_some_and(|user| user.id == user_id)
    }
}

impl From<AuthenticatedUser> for Viewer {
    fn from(user: AuthenticatedUser) -> Self {
        Viewer::User(user)
    }
}

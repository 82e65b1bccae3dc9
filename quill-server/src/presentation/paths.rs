//! URL builders for every page that handlers redirect to or link from.

pub const LOGIN: &str = "/login";
pub const HOME: &str = "/";

pub fn profile(screen_name: &str) -> String {
    format!("/users/{screen_name}")
}

pub fn create_post(screen_name: &str) -> String {
    format!("/users/{screen_name}/posts/create")
}

pub fn store_post(screen_name: &str) -> String {
    format!("/users/{screen_name}/posts")
}

pub fn show_post(screen_name: &str, slug: &str) -> String {
    format!("/users/{screen_name}/posts/{slug}")
}

pub fn edit_post(screen_name: &str, slug: &str) -> String {
    format!("/users/{screen_name}/posts/{slug}/edit")
}

pub fn delete_post(screen_name: &str, slug: &str) -> String {
    format!("/users/{screen_name}/posts/{slug}/delete")
}

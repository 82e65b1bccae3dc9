pub mod error;
pub mod post;
pub mod user;
pub mod viewer;
pub mod visibility;

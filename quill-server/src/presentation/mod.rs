pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod paths;
pub mod viewer;
pub mod views;

pub mod ai;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod models {
    pub mod language;
    pub mod slug;
}
pub mod db {
    pub mod comment_repository;
    pub mod connection;
    #[cfg(test)]
    pub mod memory;
    pub mod models;
    pub mod repository;
    pub mod user_repository;
}
pub mod api {
    pub mod blogs;
    pub mod comments;
    pub mod content;
    pub mod errors;
    pub mod translate;
}

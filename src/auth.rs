//! User identity: password hashing, session tokens, the request extractor
//! and the register/login/logout endpoints.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod password;
pub mod session;

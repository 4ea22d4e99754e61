pub mod auth;
pub mod filename;
pub mod validation;

pub mod auth;
pub mod directory;
pub mod usecase;

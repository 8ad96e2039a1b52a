pub mod auth;
pub mod common;
pub mod feedback;
pub mod files;
pub mod notes;
pub mod search;

pub mod auth;
pub mod create;
pub mod delete;
pub mod list;
pub mod prompt;
pub mod search;
pub mod shell;

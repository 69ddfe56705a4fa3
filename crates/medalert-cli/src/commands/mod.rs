pub mod common;
pub mod config;
pub mod feed;
pub mod validate;

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod export;
pub mod feedback;
pub mod global;
pub mod media;
pub mod questions;
pub mod session;

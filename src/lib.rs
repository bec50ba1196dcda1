pub mod app;
pub mod auth;
pub mod config;
pub mod graph;
pub mod meeting;
pub mod scheduler;

pub mod analytics;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod gsc;
pub mod models;

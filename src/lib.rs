//! A small blogging engine: tagged posts with scheduled publication, paginated
//! search and author-gated editing, served over axum and backed by PostgreSQL.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;

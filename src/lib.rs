// lib.rs
// Server-rendered back office for audit engagements. Every record lives in the
// remote accounting API; this crate renders pages and forwards form posts.

pub mod blocks;
pub mod config;
pub mod models;
pub mod preview;
pub mod routes;
pub mod sections;
pub mod session;
pub mod state;
pub mod tree;
pub mod validation;
pub mod workspace;

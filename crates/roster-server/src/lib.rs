//! # roster-server
//!
//! HTTP server exposing user records behind Cognito authentication.
//!
//! Request flow: inbound request → Bearer token extractor (protected
//! routes) → token verifier over the startup-fetched key set → handler →
//! file-backed record store.

pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use server::{AppState, build_app, init, run};

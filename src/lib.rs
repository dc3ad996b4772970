//! Bearer-token authentication and role-based access control for an axum API.
//!
//! - `services::auth`: token codec, credential verifier, identity resolver,
//!   request authenticator and access decision point
//! - `middleware::auth`: the request-level wiring of the above
//! - `api::v1`: signup / login / validate plus role-guarded sample routes
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;

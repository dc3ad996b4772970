//! Authentication (who are you) and authorization (are you allowed) layers.
//!
//! - `authenticate`: applied once around the whole API, never rejects
//! - `guard`: applied per route group with `route_layer`, rejects with 401/403
pub mod authenticate;
pub mod guard;

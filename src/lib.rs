//! Request-time authorization for API gateway custom authorizers.
//!
//! [`authorizer`] holds the decision engine: bearer extraction, principal resolution and
//! policy building around an injected [`TokenVerifier`](services::verifier::TokenVerifier).
//! The rest is the HTTP service that hosts it.
pub mod api;
pub mod app;
pub mod authorizer;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! HTTP service for registering user accounts and issuing bearer tokens.

/// Shared state handed to every handler.
pub mod app_state;
/// Password hashing and bearer tokens.
pub mod auth;
pub mod commands;
/// Schema bootstrap and database liveness.
pub mod db;
/// Request handlers for the `/api` routes.
pub mod handlers;
/// HTTP error envelope.
pub mod http;
/// Bearer auth and request id middleware.
pub mod middleware;
pub mod openapi;
/// Router builders, one per resource.
pub mod routes;
pub mod server;
/// Storage behind the handlers.
pub mod services;
mod tracer;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tracer_tests;

#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

//! Types shared between the Roster server and its clients: wire models,
//! the password policy, and configuration loading.

pub mod config;
/// Request and response bodies.
pub mod models;
pub mod validation;

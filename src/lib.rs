//! devproxy: a local development server
//!
//! Serves a static directory and forwards a couple of API path prefixes to a
//! single upstream, adding permissive cross-origin headers to every response.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

//! Docroot - minimal concurrent static-file server
//!
//! Core library for the HTTP layer, configuration and the listener.

pub mod config;
pub mod error;
pub mod http;
pub mod server;

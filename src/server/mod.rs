//! Listening socket and connection dispatch.

pub mod listener;

pub use listener::{Server, run};

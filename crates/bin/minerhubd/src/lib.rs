//! Library half of `minerhubd`: configuration and wiring, shared by the
//! binary and its integration tests.

pub mod bootstrap;
pub mod config;

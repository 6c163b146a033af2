//! Core abstractions for stock-crew
//!
//! This crate defines the traits and types shared by every agent in the crew:
//! the [`Agent`] trait, the per-run [`Context`] and the base [`Error`] type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};

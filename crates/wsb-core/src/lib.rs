//! Core types and trait definitions for the WSB ticker-mention bot.
//!
//! This crate is deliberately free of database and network dependencies.
//! The store and the collector depend on it; it depends on neither.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod extract;
pub mod fragment;
pub mod source;
pub mod store;
pub mod ticker;
pub mod window;

pub use error::{Error, Result};

// src/lib.rs

//! Content pipeline library.
//!
//! Mirrors a blog's Markdown posts from a WebDAV server, validates their front
//! matter, and publishes a `posts-index.json` plus the source files into a content
//! directory, swapping each output directory into place atomically.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

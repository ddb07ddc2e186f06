//! Concrete retrieval backend implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`SearchBackend`](super::provider::SearchBackend) trait.

pub mod tmdb;

pub use tmdb::TmdbBackend;

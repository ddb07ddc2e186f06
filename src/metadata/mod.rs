//! Retrieval backend system for candidate search and record fetches.
//!
//! This module defines a generic [`SearchBackend`] trait and supporting types
//! that let the resolution pipeline consume an external index without caring
//! which shape it takes (keyword search today, vector similarity tomorrow).
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and shared data types.
//! - [`providers`] -- Concrete backend implementations (TMDB).
//! - [`cache`] -- Durable metadata cache facade.

pub mod cache;
pub mod provider;
pub mod providers;

pub use cache::MetadataCache;
pub use provider::{
    Candidate, EpisodeRecord, MediaRecord, SearchBackend, SearchFilters, SeasonRecord,
};
pub use providers::TmdbBackend;

//! # reelid-common
//!
//! Shared building blocks for the reelid workspace: the unified [`Error`]
//! type, typed identifier wrappers, and the media-kind enum used across the
//! resolution pipeline.

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::ImdbId;
pub use types::MediaKind;

//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the relation model, identifier derivation, the
//! relation store contract and the shortener contract shared by the
//! storage backends and the shortener service.

pub mod error;
pub mod identifier;
pub mod relation;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{ShortenerError, StorageError};
pub use identifier::{derive_id, RelationId};
pub use relation::Relation;
pub use repository::{InsertOutcome, LookupKind, RelationStore};
pub use shortcode::ShortCode;
pub use shortener::Shortener;

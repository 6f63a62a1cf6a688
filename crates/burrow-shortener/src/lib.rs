//! URL shortener service implementation.
//!
//! This crate provides [`RelationService`], which turns long URLs into short
//! links over any [`RelationStore`](burrow_core::RelationStore) backend.
//! Core types are re-exported from `burrow_core`.

pub mod service;

pub use burrow_core::{Relation, Shortener, ShortenerError};
pub use service::{RelationService, ServiceSettings};

//! # Herd Intake Core
//!
//! Shared, I/O-free logic for Herd Intake: document and profile models,
//! text and table digests, insight aggregation, the pluggable scorer, and
//! the profile store with its key-value backend trait.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies, so the same store and aggregation logic can
//! sit behind a browser storage backend.

pub mod digest;
pub mod form;
pub mod insights;
pub mod models;
pub mod scoring;
pub mod store;

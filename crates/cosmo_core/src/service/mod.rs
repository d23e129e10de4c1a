//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the in-memory cache consumed by the UI layer.

pub mod store;

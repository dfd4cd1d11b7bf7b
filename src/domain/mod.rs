//! Domain layer types and invariants.

pub mod auth;
pub mod content;
pub mod envelope;
pub(crate) mod lenient;
pub mod resource;
pub mod search;

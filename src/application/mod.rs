//! Application services: request orchestration and upstream shape handling.

pub mod content;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod search;

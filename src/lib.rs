//! Caching, shape-normalizing gateway between the book portal frontend and
//! its upstream content API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

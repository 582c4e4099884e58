//! Catalog asset registration domain primitives.
//!
//! This crate owns the asset and state store record shapes, the projection
//! between them, and configuration resolution. It intentionally excludes AWS
//! SDK and Lambda runtime concerns.

pub mod asset;
pub mod config;

//! AWS-oriented adapters and the invocation handler for the catalog assets
//! registrar Lambda.
//!
//! Domain shapes and configuration live in `assets_registrar_core`; this crate
//! owns the adapter seams (catalog search, state store), their DataZone and
//! DynamoDB implementations, telemetry setup, and the per-process context.

pub mod adapters;
pub mod context;
pub mod handlers;
pub mod telemetry;

//! Infrastructure layer - adapters and external integrations.

pub mod broadcast;
pub mod config;
pub mod rest;
pub mod stream;
pub mod telemetry;

//! Integrations module - Remote telemetry API

pub mod api;

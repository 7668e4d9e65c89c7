//! Core module - Event loop, state and poll scheduling

pub mod app;
pub mod events;
pub mod scheduler;
pub mod state;

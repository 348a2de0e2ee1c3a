//! Command implementations.

pub mod config;
pub mod convert;
pub mod inspect;
pub mod preset;
pub mod stages;
pub mod types;

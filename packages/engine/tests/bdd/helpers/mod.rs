//! Shared helpers for step definitions

pub mod value_conversion;

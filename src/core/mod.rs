//! The core module holds the error type and the settings shared by the whole crate.

pub mod error;
pub mod settings;

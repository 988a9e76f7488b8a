//! Core types for ARCA
//!
//! Error kinds shared by every pipeline stage and their user-facing rendering.

pub mod error;

pub use error::{ArcaError, ErrorContext, classify, user_friendly_error};

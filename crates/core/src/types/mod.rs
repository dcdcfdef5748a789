//! Core types for Projectopia.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod lockout;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use lockout::Lockout;
pub use role::*;

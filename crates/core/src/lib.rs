//! Projectopia Core - Shared domain types library.
//!
//! This crate provides the types and rules shared by all Projectopia components:
//! - `web` - The role-gated project tracking server
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database access,
//! no HTTP. The decisions that protect the access-control invariants (which
//! projects a caller may see, how a desired membership is normalized, when an
//! account counts as locked) live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles and the lockout sentinel
//! - [`access`] - Callers, project visibility scopes and login landing pages
//! - [`membership`] - Deduplicated supervisor/student sets and their diffs
//! - [`validation`] - Accumulating field-level validation errors
//! - [`input`] - Validated inputs for projects, users and registrations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod input;
pub mod membership;
pub mod types;
pub mod validation;

pub use access::{Caller, ProjectScope, landing_path};
pub use membership::{Membership, MembershipChanges};
pub use types::*;
pub use validation::{FieldError, ValidationErrors};

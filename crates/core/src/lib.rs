//! `hrportal-core`
//!
//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the identity core
//! and the portal shell (no storage, no UI).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, UserId};

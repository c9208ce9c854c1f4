//! Hearth Core - Shared types library.
//!
//! This crate provides common types used across all Hearth components:
//! - `storefront` - Session, cart and REST API client for the Hearth backend
//! - `cli` - The `hearth` command-line shell
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, roles, statuses, federated
//!   identity profiles and comment threads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

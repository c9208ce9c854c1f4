//! Core types for Hearth.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod comment;
pub mod email;
pub mod id;
pub mod identity;
pub mod money;
pub mod status;

pub use comment::{AuthorSummary, Comment, CommentNode, CommentTree, MAX_REPLY_DEPTH};
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{ExternalProfile, IdTokenError};
pub use money::Money;
pub use status::*;

//! Hearth storefront client library.
//!
//! The two stateful pieces are [`session::SessionStore`] (who is logged in,
//! sole owner of the bearer credential) and [`cart::CartStore`] (the
//! persisted cart). Everything else is a stateless leaf API in [`api`] that
//! reads the transport the session store authenticates.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use hearth_storefront::cart::CartStore;
//! use hearth_storefront::config::StorefrontConfig;
//! use hearth_storefront::session::SessionStore;
//! use hearth_storefront::storage::{FileStorage, Storage};
//! use hearth_storefront::transport::ApiClient;
//!
//! let config = StorefrontConfig::from_env()?;
//! let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&config.state_dir)?);
//! let api = ApiClient::new(&config)?;
//!
//! let session = SessionStore::new(api, Arc::clone(&storage));
//! session.restore().await;
//! let cart = CartStore::load(storage);
//! # let _ = cart;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod models;
pub mod session;
pub mod storage;
pub mod transport;
pub mod validation;

//! Authentication module: token caching and credential storage.
//!
//! This module provides:
//! - `TokenCache`: the 23-hour subscription token cache backed by `auth.json`
//! - `CredentialStore`: OS-level password storage via keyring
//!
//! The token cache is the only persistent state the application owns; an
//! expired record is always replaced by a fresh authentication call.

pub mod cache;
pub mod credentials;

pub use cache::{TokenCache, TokenRecord, AUTH_FILE};
pub use credentials::CredentialStore;

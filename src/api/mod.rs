//! REST API client module for the F1 TV services.
//!
//! This module provides the `ApiClient` for communicating with the account
//! API (password authentication, API-key discovery) and the content API
//! (catalog browsing and playback URL resolution).
//!
//! Playback requests authenticate with the subscription token obtained
//! through the account authentication endpoint.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

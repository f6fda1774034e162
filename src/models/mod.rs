//! Data models for provider API responses.

pub mod catalog;

pub use catalog::{
    AdditionalStream, ApiResponse, Container, ContainerPage, PlaybackResult, UserLocationResult,
};

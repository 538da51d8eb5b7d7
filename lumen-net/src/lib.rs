//! Transport layer for the media search client.
//!
//! - [`ClientConfig`]: env-driven settings shared by the transport and the session core.
//! - [`MediaBackend`]: the fetch collaborator the session core depends on;
//!   [`ApiClient`] implements it over HTTP.
//! - [`CredentialProvider`] / [`CredentialCell`]: the injected bearer-token source.
//! - [`TokenRefresher`]: the scheduled task that keeps the cell current.

pub mod backend;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod refresh;

pub use backend::MediaBackend;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use credentials::{CredentialCell, CredentialProvider, NoCredentials, StaticToken};
pub use error::ApiError;
pub use refresh::{RefreshHandle, RefreshOutcome, TokenIssuer, TokenRefresher};

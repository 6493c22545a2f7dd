//! REST API client module for the JobDeck service.
//!
//! This module provides the `ApiClient` for communicating with the JobDeck
//! API and the `Operation` descriptor describing a single call.
//!
//! The API uses JWT bearer token authentication; the token is read from the
//! shared `TokenStore` on every request.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginOutcome, OnUnauthorized, Operation, DEFAULT_API_BASE_URL};
pub use error::ApiError;

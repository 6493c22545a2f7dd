//! Core library for JobDeck clients.
//!
//! Provides the authentication and session machinery shared by every
//! surface: the bearer-credential store, the authenticated API client, the
//! email-verification challenge flow, and role-based route gating. Surfaces
//! (TUI, future GUIs) stay thin: they render state owned here and forward
//! events into it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routing;

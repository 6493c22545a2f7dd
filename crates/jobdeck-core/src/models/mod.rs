//! Domain and wire types shared across the client.

pub mod user;

pub use user::{AuthPayload, Role, User};

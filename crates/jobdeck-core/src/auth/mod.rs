//! Authentication module for session and credential management.
//!
//! This module provides:
//! - `TokenStore`: single source of truth for the bearer credential, with
//!   an injectable durable backend
//! - `CurrentUserCache` / `SessionState`: "who am I" resolution consumed by
//!   the route guard
//! - `verification`: the one-time-code email verification flow
//! - `SavedLogin`: OS-keychain storage for login passwords

pub mod credentials;
pub mod session;
pub mod token_store;
pub mod verification;

pub use credentials::SavedLogin;
pub use session::{CurrentUserCache, Session, SessionState};
pub use token_store::{MemoryBackend, SessionFileBackend, TokenBackend, TokenStore};
pub use verification::{
    PendingVerification, ResendCode, SubmitCode, VerificationFlow, VerifiedOutcome, VerifyEntry,
    VerifyPhase, CODE_LENGTH, RESEND_COOLDOWN_SECS,
};

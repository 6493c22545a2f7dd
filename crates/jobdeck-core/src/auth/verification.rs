//! Email-verification challenge flow.
//!
//! The flow is driven entirely by explicit events: typed characters,
//! one-second clock ticks, and request completions fed back by the caller.
//! No timers or network handles live here, so every transition is
//! unit-testable in isolation.
//!
//! The caller performs the actual network calls: `push_char` hands back a
//! `SubmitCode` command when the code is complete, `request_resend` hands
//! back a `ResendCode` command when the cooldown allows one, and the results
//! come back through `on_submit_result` / `on_resend_result`.

use tracing::{debug, warn};

use crate::api::ApiError;
use crate::auth::{CurrentUserCache, TokenStore};
use crate::models::{AuthPayload, User};
use crate::routing;

/// Required one-time-code length. Submission triggers automatically the
/// moment the entered code reaches exactly this many digits.
pub const CODE_LENGTH: usize = 6;

/// Seconds to wait after code issuance, or after a successful resend,
/// before another resend is allowed.
pub const RESEND_COOLDOWN_SECS: u32 = 60;

/// An email address waiting on a one-time code, produced by a login or
/// registration attempt that came back "verify your email". At most one
/// exists at a time; a newer attempt overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub email: String,
}

impl PendingVerification {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPhase {
    /// Waiting for the user to finish typing the code.
    AwaitingCode,
    /// A submission is in flight; further input and completions for other
    /// phases are ignored.
    Verifying,
    /// Terminal success.
    Verified,
}

/// Entry decision for the verification surface.
#[derive(Debug)]
pub enum VerifyEntry {
    Flow(Box<VerificationFlow>),
    /// No pending email to verify. The surface must send the user back to
    /// registration; it never prompts for an address itself.
    RedirectToRegister,
}

/// Command: send the pending email and the completed code to the
/// verification endpoint, then report back via `on_submit_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCode {
    pub email: String,
    pub code: String,
}

/// Command: ask the server to email a fresh code, then report back via
/// `on_resend_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCode {
    pub email: String,
}

#[derive(Debug)]
struct ResendCooldown {
    remaining: u32,
    in_flight: bool,
}

impl ResendCooldown {
    fn start() -> Self {
        Self {
            remaining: RESEND_COOLDOWN_SECS,
            in_flight: false,
        }
    }

    fn restart(&mut self) {
        self.remaining = RESEND_COOLDOWN_SECS;
    }

    /// One-second tick; stops at zero and never goes negative.
    fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

/// The one-time-code verification state machine.
#[derive(Debug)]
pub struct VerificationFlow {
    pending: PendingVerification,
    phase: VerifyPhase,
    code: String,
    error: Option<String>,
    cooldown: ResendCooldown,
}

impl VerificationFlow {
    /// Enter the verification surface. Without a pending email there is
    /// nothing to verify and the caller must redirect to registration.
    pub fn enter(pending: Option<PendingVerification>) -> VerifyEntry {
        match pending {
            Some(pending) => {
                debug!(email = %pending.email, "Entering verification flow");
                VerifyEntry::Flow(Box::new(Self {
                    pending,
                    phase: VerifyPhase::AwaitingCode,
                    code: String::new(),
                    error: None,
                    cooldown: ResendCooldown::start(),
                }))
            }
            None => VerifyEntry::RedirectToRegister,
        }
    }

    pub fn email(&self) -> &str {
        &self.pending.email
    }

    pub fn phase(&self) -> VerifyPhase {
        self.phase
    }

    /// The code as typed so far.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Message from the most recent failed submission or resend, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // =========================================================================
    // Code entry
    // =========================================================================

    /// Feed one typed character. Non-digits are ignored and input is capped
    /// at [`CODE_LENGTH`]. Returns the submit command exactly on the
    /// transition to the full length; a retained full-length code (e.g.
    /// after a failed attempt) does not retrigger until characters are
    /// deleted and re-entered.
    pub fn push_char(&mut self, c: char) -> Option<SubmitCode> {
        if self.phase != VerifyPhase::AwaitingCode {
            return None;
        }
        if !c.is_ascii_digit() || self.code.len() >= CODE_LENGTH {
            return None;
        }
        self.code.push(c);
        if self.code.len() == CODE_LENGTH {
            self.phase = VerifyPhase::Verifying;
            debug!(email = %self.pending.email, "Code complete, submitting");
            return Some(SubmitCode {
                email: self.pending.email.clone(),
                code: self.code.clone(),
            });
        }
        None
    }

    pub fn backspace(&mut self) {
        if self.phase == VerifyPhase::AwaitingCode {
            self.code.pop();
        }
    }

    pub fn clear_code(&mut self) {
        if self.phase == VerifyPhase::AwaitingCode {
            self.code.clear();
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Apply the outcome of a submission. A completion arriving in any
    /// phase other than `Verifying` is stale and dropped, per the rule that
    /// a superseded request's result is ignored rather than cancelled.
    pub fn on_submit_result(
        &mut self,
        result: Result<AuthPayload, ApiError>,
    ) -> Option<VerifiedOutcome> {
        if self.phase != VerifyPhase::Verifying {
            warn!(phase = ?self.phase, "Dropping verification result arriving out of phase");
            return None;
        }
        match result {
            Ok(payload) => {
                debug!(email = %self.pending.email, role = %payload.user.role, "Email verified");
                self.phase = VerifyPhase::Verified;
                self.error = None;
                Some(VerifiedOutcome { payload })
            }
            Err(e) => {
                // The entered code stays put; the user decides what to retype.
                self.phase = VerifyPhase::AwaitingCode;
                self.error = Some(e.to_string());
                None
            }
        }
    }

    // =========================================================================
    // Resend
    // =========================================================================

    /// Seconds left before another resend is allowed.
    pub fn seconds_until_resend(&self) -> u32 {
        self.cooldown.remaining
    }

    pub fn resend_available(&self) -> bool {
        self.cooldown.is_expired()
            && !self.cooldown.in_flight
            && self.phase != VerifyPhase::Verified
    }

    /// Ask for a fresh code. A no-op (not merely disabled visually) while
    /// the cooldown is active or a resend is already in flight.
    pub fn request_resend(&mut self) -> Option<ResendCode> {
        if !self.resend_available() {
            return None;
        }
        self.cooldown.in_flight = true;
        debug!(email = %self.pending.email, "Requesting code resend");
        Some(ResendCode {
            email: self.pending.email.clone(),
        })
    }

    /// Apply the outcome of a resend. Success restarts the cooldown.
    pub fn on_resend_result(&mut self, result: Result<(), ApiError>) {
        if !self.cooldown.in_flight {
            warn!("Dropping resend result with no resend in flight");
            return;
        }
        self.cooldown.in_flight = false;
        match result {
            Ok(()) => {
                self.cooldown.restart();
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    /// One-second clock tick from the host event loop.
    pub fn tick(&mut self) {
        self.cooldown.tick();
    }
}

/// Successful verification: the credential and user the server returned.
#[derive(Debug)]
pub struct VerifiedOutcome {
    payload: AuthPayload,
}

impl VerifiedOutcome {
    pub fn user(&self) -> &User {
        &self.payload.user
    }

    /// Install the credential, drop any cached current-user snapshot so the
    /// next read refetches authoritative server state, and return the
    /// landing route for the verified user's role.
    pub fn apply(self, tokens: &TokenStore, users: &mut CurrentUserCache) -> &'static str {
        tokens.set(Some(&self.payload.token));
        users.invalidate();
        routing::post_verify_route(self.payload.user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryBackend;
    use crate::models::Role;

    fn flow() -> VerificationFlow {
        match VerificationFlow::enter(Some(PendingVerification::new("pat@example.com"))) {
            VerifyEntry::Flow(flow) => *flow,
            VerifyEntry::RedirectToRegister => panic!("expected a flow"),
        }
    }

    fn payload(role: Role) -> AuthPayload {
        AuthPayload {
            token: "tok-verified".to_string(),
            user: User {
                id: "u9".to_string(),
                email: "pat@example.com".to_string(),
                name: None,
                role,
                is_verified: Some(true),
            },
        }
    }

    fn type_code(flow: &mut VerificationFlow, code: &str) -> Option<SubmitCode> {
        let mut submit = None;
        for c in code.chars() {
            submit = flow.push_char(c);
        }
        submit
    }

    #[test]
    fn test_entry_without_pending_redirects_to_registration() {
        assert!(matches!(
            VerificationFlow::enter(None),
            VerifyEntry::RedirectToRegister
        ));
    }

    #[test]
    fn test_auto_submit_exactly_at_full_length() {
        let mut flow = flow();
        for (i, c) in "12345".chars().enumerate() {
            assert!(flow.push_char(c).is_none(), "no submit at length {}", i + 1);
            assert_eq!(flow.phase(), VerifyPhase::AwaitingCode);
        }
        let submit = flow.push_char('6').expect("sixth digit triggers submission");
        assert_eq!(submit.code, "123456");
        assert_eq!(submit.email, "pat@example.com");
        assert_eq!(flow.phase(), VerifyPhase::Verifying);
    }

    #[test]
    fn test_input_capped_at_six_digits() {
        let mut flow = flow();
        type_code(&mut flow, "123456");
        // Back to AwaitingCode with the full code retained.
        flow.on_submit_result(Err(ApiError::InvalidResponse("bad code".into())));
        assert!(flow.push_char('7').is_none());
        assert_eq!(flow.code(), "123456");
    }

    #[test]
    fn test_non_digits_ignored() {
        let mut flow = flow();
        assert!(flow.push_char('a').is_none());
        assert!(flow.push_char(' ').is_none());
        assert_eq!(flow.code(), "");
    }

    #[test]
    fn test_input_ignored_while_verifying() {
        let mut flow = flow();
        type_code(&mut flow, "123456");
        assert_eq!(flow.phase(), VerifyPhase::Verifying);
        assert!(flow.push_char('1').is_none());
        flow.backspace();
        assert_eq!(flow.code(), "123456");
    }

    #[test]
    fn test_failure_keeps_code_and_surfaces_message() {
        let mut flow = flow();
        type_code(&mut flow, "000000");
        let outcome =
            flow.on_submit_result(Err(ApiError::InvalidResponse("Invalid or expired OTP".into())));
        assert!(outcome.is_none());
        assert_eq!(flow.phase(), VerifyPhase::AwaitingCode);
        assert_eq!(flow.code(), "000000");
        assert!(flow.error().unwrap().contains("Invalid or expired OTP"));
    }

    #[test]
    fn test_no_resubmit_until_code_edited_and_refilled() {
        let mut flow = flow();
        type_code(&mut flow, "111111");
        flow.on_submit_result(Err(ApiError::InvalidResponse("bad code".into())));

        // Retained full-length code does not retrigger.
        assert!(flow.push_char('2').is_none());

        // Deleting and re-entering the last digit triggers a fresh attempt.
        flow.backspace();
        let submit = flow.push_char('2').expect("refill triggers submission");
        assert_eq!(submit.code, "111112");
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut flow = flow();
        assert!(flow
            .on_submit_result(Ok(payload(Role::Employer)))
            .is_none());
        assert_eq!(flow.phase(), VerifyPhase::AwaitingCode);
    }

    #[test]
    fn test_success_installs_credential_and_routes_by_role() {
        let tokens = TokenStore::new(MemoryBackend::default());
        let mut users = CurrentUserCache::new();
        users.note_resolved(None);

        let mut flow = flow();
        type_code(&mut flow, "123456");
        let outcome = flow
            .on_submit_result(Ok(payload(Role::Employer)))
            .expect("success yields an outcome");
        assert_eq!(flow.phase(), VerifyPhase::Verified);

        let route = outcome.apply(&tokens, &mut users);
        assert_eq!(route, "/employer/dashboard");
        assert_eq!(tokens.get().as_deref(), Some("tok-verified"));
        assert!(users.needs_fetch());
    }

    #[test]
    fn test_unknown_role_lands_on_default_dashboard() {
        let tokens = TokenStore::new(MemoryBackend::default());
        let mut users = CurrentUserCache::new();

        let mut flow = flow();
        type_code(&mut flow, "123456");
        let outcome = flow
            .on_submit_result(Ok(payload(Role::Unknown)))
            .expect("success yields an outcome");
        assert_eq!(outcome.apply(&tokens, &mut users), "/dashboard");
    }

    #[test]
    fn test_resend_blocked_during_cooldown() {
        let mut flow = flow();
        assert_eq!(flow.seconds_until_resend(), RESEND_COOLDOWN_SECS);
        assert!(!flow.resend_available());
        assert!(flow.request_resend().is_none());
        // The refused request changed nothing.
        assert_eq!(flow.seconds_until_resend(), RESEND_COOLDOWN_SECS);
    }

    #[test]
    fn test_resend_enabled_exactly_at_zero() {
        let mut flow = flow();
        for _ in 0..RESEND_COOLDOWN_SECS - 1 {
            flow.tick();
            assert!(!flow.resend_available());
        }
        flow.tick();
        assert_eq!(flow.seconds_until_resend(), 0);
        assert!(flow.resend_available());
    }

    #[test]
    fn test_cooldown_saturates_at_zero() {
        let mut flow = flow();
        for _ in 0..RESEND_COOLDOWN_SECS + 30 {
            flow.tick();
        }
        assert_eq!(flow.seconds_until_resend(), 0);
    }

    #[test]
    fn test_resend_in_flight_blocks_further_resends() {
        let mut flow = flow();
        for _ in 0..RESEND_COOLDOWN_SECS {
            flow.tick();
        }
        assert!(flow.request_resend().is_some());
        assert!(!flow.resend_available());
        assert!(flow.request_resend().is_none());
    }

    #[test]
    fn test_successful_resend_restarts_cooldown() {
        let mut flow = flow();
        for _ in 0..RESEND_COOLDOWN_SECS {
            flow.tick();
        }
        flow.request_resend().expect("resend allowed at zero");
        flow.on_resend_result(Ok(()));
        assert_eq!(flow.seconds_until_resend(), RESEND_COOLDOWN_SECS);
        assert!(!flow.resend_available());
    }

    #[test]
    fn test_failed_resend_leaves_cooldown_expired() {
        let mut flow = flow();
        for _ in 0..RESEND_COOLDOWN_SECS {
            flow.tick();
        }
        flow.request_resend().expect("resend allowed at zero");
        flow.on_resend_result(Err(ApiError::RateLimited));
        assert_eq!(flow.seconds_until_resend(), 0);
        assert!(flow.resend_available());
        assert!(flow.error().is_some());
    }
}

//! Application state management for the JobDeck TUI.
//!
//! This module contains the `App` struct that owns the core services
//! (token store, API client, current-user cache) and the per-surface UI
//! state. All auth decisions live in `jobdeck-core`; the app only renders
//! them and forwards events.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use jobdeck_core::api::{ApiClient, ApiError, LoginOutcome};
use jobdeck_core::auth::{
    CurrentUserCache, PendingVerification, SavedLogin, SessionFileBackend, SubmitCode, TokenStore,
    VerificationFlow, VerifyEntry,
};
use jobdeck_core::config::Config;
use jobdeck_core::models::{AuthPayload, Role, User};
use jobdeck_core::routing::{self, Decision};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Auth flows issue one request at a time; 16 leaves plenty of headroom.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned network tasks to the main loop.
pub enum AppEvent {
    /// The "who am I" probe completed (None = signed out).
    SessionResolved(Option<User>),
    /// The probe could not reach the server.
    SessionProbeFailed(String),
    /// A login attempt finished.
    LoginFinished(Result<LoginOutcome, ApiError>),
    /// A code submission finished.
    VerifyFinished(Result<AuthPayload, ApiError>),
    /// A resend request finished.
    ResendFinished(Result<(), ApiError>),
}

// ============================================================================
// Surface Table
// ============================================================================

/// Allowed roles per protected surface. The inner `None` means the surface
/// is role-agnostic but still requires an authenticated session; the outer
/// `None` marks a public surface the guard does not evaluate.
fn surface_requirements(route: &str) -> Option<Option<&'static [Role]>> {
    const EMPLOYER_ONLY: &[Role] = &[Role::Employer];
    const ADMIN_ONLY: &[Role] = &[Role::Admin];
    match route {
        routing::SEEKER_DASHBOARD => Some(None),
        routing::EMPLOYER_DASHBOARD => Some(Some(EMPLOYER_ONLY)),
        routing::ADMIN_DASHBOARD => Some(Some(ADMIN_ONLY)),
        _ => None,
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub tokens: Arc<TokenStore>,
    pub api: ApiClient,
    pub users: CurrentUserCache,

    // Navigation
    pub route: String,
    pub state: AppState,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_in_flight: bool,

    // Verification surface state
    pending: Option<PendingVerification>,
    pub verify: Option<VerificationFlow>,

    // Status message
    pub status_message: Option<String>,

    // Background task channel
    probe_in_flight: bool,
    events_rx: mpsc::Receiver<AppEvent>,
    events_tx: mpsc::Sender<AppEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let tokens = Arc::new(TokenStore::new(SessionFileBackend::new(cache_dir)));
        let api = ApiClient::new(&config.api_base_url(), Arc::clone(&tokens))?;

        let login_email = std::env::var("JOBDECK_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();

        // Prefill the password from the environment or the OS keychain
        let login_password = std::env::var("JOBDECK_PASSWORD")
            .ok()
            .or_else(|| {
                if login_email.is_empty() {
                    None
                } else {
                    SavedLogin::password(&login_email).ok()
                }
            })
            .unwrap_or_default();

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_focus = if login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };

        Ok(Self {
            config,
            tokens,
            api,
            users: CurrentUserCache::new(),

            // Start on the dashboard; the route guard resolves the session
            // and redirects to login if nothing is persisted.
            route: routing::SEEKER_DASHBOARD.to_string(),
            state: AppState::Normal,

            login_email,
            login_password,
            login_focus,
            login_error: None,
            login_in_flight: false,

            pending: None,
            verify: None,

            status_message: None,

            probe_in_flight: false,
            events_rx: rx,
            events_tx: tx,
        })
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, route: &str) {
        if self.route == route {
            return;
        }
        // Leaving the verification surface drops the active challenge.
        if self.route == routing::VERIFY_ROUTE {
            self.verify = None;
        }
        debug!(from = %self.route, to = route, "Navigating");
        self.route = route.to_string();
        if route == routing::LOGIN_ROUTE {
            self.begin_login();
        }
    }

    /// Gate the current surface. Runs every loop iteration: redirects are
    /// applied, a pending session resolution kicks off the probe, and the
    /// verification surface enforces its entry precondition.
    pub fn apply_guard(&mut self) {
        if self.route == routing::VERIFY_ROUTE && self.verify.is_none() {
            match VerificationFlow::enter(self.pending.take()) {
                VerifyEntry::Flow(flow) => self.verify = Some(*flow),
                VerifyEntry::RedirectToRegister => {
                    debug!("No pending verification, redirecting to registration");
                    self.navigate(routing::REGISTER_ROUTE);
                }
            }
            return;
        }

        let Some(required) = surface_requirements(&self.route) else {
            return;
        };
        match routing::decide(&self.users.state(self.tokens.get()), required) {
            Decision::Render => {}
            Decision::Pending => {
                if self.users.needs_fetch() {
                    self.spawn_session_probe();
                }
            }
            Decision::RedirectTo(target) => {
                debug!(from = %self.route, to = target, "Route guard redirect");
                self.navigate(target);
            }
        }
    }

    /// The guard's view of the current surface, for rendering (`None` for
    /// public surfaces).
    pub fn guard_decision(&self) -> Option<Decision> {
        surface_requirements(&self.route)
            .map(|required| routing::decide(&self.users.state(self.tokens.get()), required))
    }

    // =========================================================================
    // Session Resolution
    // =========================================================================

    fn spawn_session_probe(&mut self) {
        if self.probe_in_flight {
            return;
        }
        self.probe_in_flight = true;
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match api.current_user().await {
                Ok(user) => AppEvent::SessionResolved(user),
                Err(e) => AppEvent::SessionProbeFailed(e.to_string()),
            };
            let _ = tx.send(event).await;
        });
    }

    // =========================================================================
    // Login
    // =========================================================================

    pub fn begin_login(&mut self) {
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    pub fn can_add_email_char(&self) -> bool {
        self.login_email.len() < MAX_EMAIL_LENGTH
    }

    pub fn can_add_password_char(&self) -> bool {
        self.login_password.len() < MAX_PASSWORD_LENGTH
    }

    /// Attempt login with the credentials from the login form
    pub fn submit_login(&mut self) {
        if self.login_in_flight {
            return;
        }
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();
        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }

        self.login_error = None;
        self.login_in_flight = true;

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.login(&email, &password).await;
            let _ = tx.send(AppEvent::LoginFinished(result)).await;
        });
    }

    fn finish_login(&mut self, result: Result<LoginOutcome, ApiError>) {
        self.login_in_flight = false;
        match result {
            Ok(LoginOutcome::SignedIn(payload)) => {
                let email = self.login_email.trim().to_string();
                if let Err(e) = SavedLogin::remember(&email, &self.login_password) {
                    warn!(error = %e, "Failed to store login in keychain");
                }
                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.tokens.set(Some(&payload.token));
                let role = payload.user.role;
                self.users.note_resolved(Some(payload.user));
                self.login_password.clear();
                info!(role = %role, "Login successful");
                self.navigate(routing::canonical_home(role));
            }
            Ok(LoginOutcome::VerificationRequired { email, message }) => {
                debug!(email = %email, "Email verification required");
                self.status_message = Some(message);
                self.begin_verification(email);
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(match e {
                    ApiError::Unauthorized => "Invalid email or password".to_string(),
                    ApiError::Network(_) => {
                        "Unable to connect to server. Check your internet connection.".to_string()
                    }
                    other => other.to_string(),
                });
            }
        }
    }

    /// Hand the federated login entry URL to the user; the browser takes it
    /// from there.
    pub fn show_google_login(&mut self) {
        match self.api.google_login_url() {
            Ok(url) => self.status_message = Some(format!("Open in your browser: {}", url)),
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Route into the code-entry surface for an address that still needs
    /// verifying. A newer attempt overwrites any previous pending address.
    pub fn begin_verification(&mut self, email: String) {
        self.pending = Some(PendingVerification::new(email));
        self.verify = None;
        self.navigate(routing::VERIFY_ROUTE);
    }

    /// Feed a typed character into the code field, dispatching the
    /// submission the moment the flow hands one back.
    pub fn push_code_char(&mut self, c: char) {
        let Some(flow) = self.verify.as_mut() else {
            return;
        };
        if let Some(submit) = flow.push_char(c) {
            self.spawn_code_submission(submit);
        }
    }

    fn spawn_code_submission(&mut self, submit: SubmitCode) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.verify_otp(&submit.email, &submit.code).await;
            let _ = tx.send(AppEvent::VerifyFinished(result)).await;
        });
    }

    fn finish_verification(&mut self, result: Result<AuthPayload, ApiError>) {
        let Some(flow) = self.verify.as_mut() else {
            return;
        };
        if let Some(outcome) = flow.on_submit_result(result) {
            let route = outcome.apply(&self.tokens, &mut self.users);
            info!(route, "Email verified, session established");
            self.status_message = Some("Email verified".to_string());
            self.verify = None;
            self.navigate(route);
        }
    }

    pub fn request_resend(&mut self) {
        let Some(flow) = self.verify.as_mut() else {
            return;
        };
        let Some(resend) = flow.request_resend() else {
            return;
        };
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.resend_otp(&resend.email).await;
            let _ = tx.send(AppEvent::ResendFinished(result)).await;
        });
    }

    pub fn leave_verification(&mut self) {
        self.navigate(routing::LOGIN_ROUTE);
    }

    // =========================================================================
    // Session Lifecycle
    // =========================================================================

    pub fn logout(&mut self) {
        info!("Signing out");
        self.tokens.clear();
        self.users.invalidate();
        self.status_message = Some("Signed out".to_string());
        self.navigate(routing::LOGIN_ROUTE);
    }

    // =========================================================================
    // Event Loop Integration
    // =========================================================================

    /// Apply completed background tasks. Called once per loop iteration.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::SessionResolved(user) => {
                    self.probe_in_flight = false;
                    debug!(signed_in = user.is_some(), "Session probe resolved");
                    self.users.note_resolved(user);
                }
                AppEvent::SessionProbeFailed(message) => {
                    self.probe_in_flight = false;
                    warn!(error = %message, "Session probe failed");
                    // Treat an unreachable server as signed out rather than
                    // spinning on the probe.
                    self.users.note_resolved(None);
                    self.status_message = Some(message);
                }
                AppEvent::LoginFinished(result) => self.finish_login(result),
                AppEvent::VerifyFinished(result) => self.finish_verification(result),
                AppEvent::ResendFinished(result) => {
                    if let Some(flow) = self.verify.as_mut() {
                        flow.on_resend_result(result);
                    }
                }
            }
        }
    }

    /// One-second clock tick; drives the resend countdown.
    pub fn on_tick(&mut self) {
        if let Some(flow) = self.verify.as_mut() {
            flow.tick();
        }
    }
}

//! Keyboard input handling for the TUI.
//!
//! Translates keyboard events into application state changes for whichever
//! surface is active.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use jobdeck_core::routing;

use crate::app::{App, AppState, LoginFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Any keypress clears a lingering status message.
    app.status_message = None;

    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.route.as_str() {
        routing::LOGIN_ROUTE => handle_login_input(app, key),
        routing::VERIFY_ROUTE => handle_verification_input(app, key),
        routing::REGISTER_ROUTE => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                app.navigate(routing::LOGIN_ROUTE);
            }
            Ok(false)
        }
        _ => handle_dashboard_input(app, key),
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Char('g') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.show_google_login();
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if app.can_add_email_char() {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if app.can_add_password_char() {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_verification_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.leave_verification(),
        KeyCode::Backspace => {
            if let Some(flow) = app.verify.as_mut() {
                flow.backspace();
            }
        }
        KeyCode::Delete => {
            if let Some(flow) = app.verify.as_mut() {
                flow.clear_code();
            }
        }
        KeyCode::Char('r') | KeyCode::Char('R') => app.request_resend(),
        KeyCode::Char(c) => app.push_code_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('l') => app.logout(),
        _ => {}
    }
    Ok(false)
}

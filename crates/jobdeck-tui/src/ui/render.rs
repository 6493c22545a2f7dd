use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use jobdeck_core::auth::{VerificationFlow, VerifyPhase, CODE_LENGTH};
use jobdeck_core::routing::{self, Decision};

use crate::app::{App, AppState, LoginFocus};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  JobDeck";
    let route = app.route.clone();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + route.len() as u16 + 4) as usize,
        )),
        Span::styled(route, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    // A pending session resolution renders as a neutral loading state; no
    // surface content, no redirect flash.
    if matches!(app.guard_decision(), Some(Decision::Pending)) {
        render_loading(frame, area);
        return;
    }

    match app.route.as_str() {
        routing::LOGIN_ROUTE => render_login(frame, app, area),
        routing::VERIFY_ROUTE => {
            if let Some(flow) = app.verify.as_ref() {
                render_verification(frame, flow, area);
            }
        }
        routing::REGISTER_ROUTE => render_register(frame, area),
        _ => render_dashboard(frame, app, area),
    }
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let dialog = centered_rect_fixed(30, 3, area);
    let lines = vec![Line::from(Span::styled(
        "  Resolving session...",
        styles::muted_style(),
    ))];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let dialog = centered_rect_fixed(48, height, area);
    frame.render_widget(Clear, dialog);

    let mut lines = vec![
        Line::from(Span::styled("   Sign in to JobDeck", styles::title_style())),
        Line::from(""),
    ];

    // Email field
    let email_focused = app.login_focus == LoginFocus::Email;
    let email_style = if email_focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };
    let email_display = format!("{:<24}", app.login_email);
    let cursor = if email_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Email:    [", styles::muted_style()),
        Span::styled(format!("{}{}", email_display, cursor), email_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field (masked)
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };
    let password_masked: String = "*".repeat(app.login_password.len().min(24));
    let password_display = format!("{:<24}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{}{}", password_display, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Sign-in button
    let button_focused = app.login_focus == LoginFocus::Button;
    lines.push(Line::from(""));
    let label = if app.login_in_flight {
        " Signing in... "
    } else if button_focused {
        " ▶ Sign in ◀ "
    } else {
        "   Sign in   "
    };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Ctrl+G", styles::help_key_style()),
        Span::styled(" continue with Google", styles::muted_style()),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_verification(frame: &mut Frame, flow: &VerificationFlow, area: Rect) {
    let height = if flow.error().is_some() { 13 } else { 11 };
    let dialog = centered_rect_fixed(52, height, area);
    frame.render_widget(Clear, dialog);

    let mut lines = vec![
        Line::from(Span::styled("   Verify your email", styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::raw("   "),
            Span::styled("We sent a 6-digit code to ", styles::muted_style()),
            Span::styled(flow.email().to_string(), styles::field_style()),
        ]),
        Line::from(""),
    ];

    // Code slots: entered digits then placeholders
    let mut slots = String::from("      ");
    for i in 0..CODE_LENGTH {
        match flow.code().chars().nth(i) {
            Some(c) => slots.push(c),
            None => slots.push('_'),
        }
        slots.push(' ');
        slots.push(' ');
    }
    lines.push(Line::from(Span::styled(slots, styles::selected_style())));
    lines.push(Line::from(""));

    if flow.phase() == VerifyPhase::Verifying {
        lines.push(Line::from(Span::styled(
            "   Checking code...",
            styles::muted_style(),
        )));
    } else if flow.resend_available() {
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled("r", styles::help_key_style()),
            Span::styled(" resend code", styles::success_style()),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            format!("   Resend available in {}s", flow.seconds_until_resend()),
            styles::muted_style(),
        )));
    }

    if let Some(error) = flow.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_register(frame: &mut Frame, area: Rect) {
    let dialog = centered_rect_fixed(52, 7, area);
    frame.render_widget(Clear, dialog);

    let lines = vec![
        Line::from(Span::styled("   Nothing to verify", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "   No verification is pending for this session.",
            styles::field_style(),
        )),
        Line::from(Span::styled(
            "   Create an account on the web, then sign in here.",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.route.as_str() {
        routing::EMPLOYER_DASHBOARD => " Employer Dashboard ",
        routing::ADMIN_DASHBOARD => " Admin Dashboard ",
        _ => " Dashboard ",
    };

    let mut lines = vec![Line::from("")];
    if let Some(user) = app.users.user() {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("Signed in as ", styles::muted_style()),
            Span::styled(user.display_name().to_string(), styles::field_style()),
            Span::styled(
                format!("  ({})", user.role.display_name()),
                styles::success_style(),
            ),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Listings, applications, and analytics live in the web app.",
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let text = if let Some(ref message) = app.status_message {
        message.clone()
    } else {
        match app.route.as_str() {
            routing::LOGIN_ROUTE => {
                " Tab next field | Enter sign in | Ctrl+G Google | Esc quit".to_string()
            }
            routing::VERIFY_ROUTE => {
                " Type the code | Backspace edit | r resend | Esc back to login".to_string()
            }
            _ => " l log out | q quit".to_string(),
        }
    };

    frame.render_widget(
        Paragraph::new(Line::from(Span::raw(text))).style(styles::status_bar_style()),
        area,
    );
}

fn render_quit_overlay(frame: &mut Frame) {
    let dialog = centered_rect_fixed(30, 5, frame.area());
    frame.render_widget(Clear, dialog);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Quit? "),
            Span::styled("y", styles::help_key_style()),
            Span::raw("es / "),
            Span::styled("n", styles::help_key_style()),
            Span::raw("o"),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

//! Role-gated navigation decisions.
//!
//! `decide` is a total, side-effect-free function of the resolved session
//! state and a surface's allowed roles; identical inputs always yield the
//! identical decision, so gating is tested without network or timers.

use crate::auth::SessionState;
use crate::models::Role;

pub const ROOT_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";
pub const VERIFY_ROUTE: &str = "/verify-email";
pub const SEEKER_DASHBOARD: &str = "/dashboard";
pub const EMPLOYER_DASHBOARD: &str = "/employer/dashboard";
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";

/// Landing page for an authenticated role. Anything undocumented falls
/// back to the site root.
pub const fn canonical_home(role: Role) -> &'static str {
    match role {
        Role::JobSeeker => SEEKER_DASHBOARD,
        Role::Employer => EMPLOYER_DASHBOARD,
        Role::Admin => ADMIN_DASHBOARD,
        Role::Unknown => ROOT_ROUTE,
    }
}

/// Destination after a successful code verification. Unlike
/// [`canonical_home`], an unrecognized role lands on the default dashboard.
pub const fn post_verify_route(role: Role) -> &'static str {
    match role {
        Role::JobSeeker | Role::Unknown => SEEKER_DASHBOARD,
        Role::Employer => EMPLOYER_DASHBOARD,
        Role::Admin => ADMIN_DASHBOARD,
    }
}

/// Per-navigation gating decision. Ephemeral; computed fresh each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Render,
    RedirectTo(&'static str),
    /// Session resolution has not completed; show a neutral loading state
    /// and take no redirect action yet.
    Pending,
}

/// Decide whether a surface renders for the current session.
///
/// `required` of `None` means the surface is role-agnostic but still needs
/// an authenticated session; a wrong-role session is sent to its own home
/// rather than to the login page.
pub fn decide(state: &SessionState, required: Option<&[Role]>) -> Decision {
    let session = match state {
        SessionState::Unresolved => return Decision::Pending,
        SessionState::Anonymous => return Decision::RedirectTo(LOGIN_ROUTE),
        SessionState::SignedIn(session) => session,
    };
    match required {
        Some(roles) if !roles.contains(&session.user.role) => {
            Decision::RedirectTo(canonical_home(session.user.role))
        }
        _ => Decision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::models::User;

    const ALL_ROLES: [Role; 4] = [Role::JobSeeker, Role::Employer, Role::Admin, Role::Unknown];

    fn signed_in(role: Role) -> SessionState {
        SessionState::SignedIn(Session {
            token: "tok".to_string(),
            user: User {
                id: "u1".to_string(),
                email: "user@example.com".to_string(),
                name: None,
                role,
                is_verified: Some(true),
            },
        })
    }

    #[test]
    fn test_unresolved_session_is_pending() {
        assert_eq!(decide(&SessionState::Unresolved, None), Decision::Pending);
        assert_eq!(
            decide(&SessionState::Unresolved, Some(&[Role::Admin])),
            Decision::Pending
        );
    }

    #[test]
    fn test_anonymous_redirects_to_login() {
        assert_eq!(
            decide(&SessionState::Anonymous, None),
            Decision::RedirectTo(LOGIN_ROUTE)
        );
        assert_eq!(
            decide(&SessionState::Anonymous, Some(&[Role::Employer])),
            Decision::RedirectTo(LOGIN_ROUTE)
        );
    }

    #[test]
    fn test_role_agnostic_surface_renders_for_any_session() {
        for role in ALL_ROLES {
            assert_eq!(decide(&signed_in(role), None), Decision::Render);
        }
    }

    #[test]
    fn test_renders_iff_role_is_allowed() {
        let sets: [&[Role]; 5] = [
            &[Role::JobSeeker],
            &[Role::Employer],
            &[Role::Admin],
            &[Role::JobSeeker, Role::Employer],
            &[],
        ];
        for role in ALL_ROLES {
            for set in sets {
                let decision = decide(&signed_in(role), Some(set));
                if set.contains(&role) {
                    assert_eq!(decision, Decision::Render, "role {:?} in {:?}", role, set);
                } else {
                    assert_eq!(
                        decision,
                        Decision::RedirectTo(canonical_home(role)),
                        "role {:?} not in {:?}",
                        role,
                        set
                    );
                }
            }
        }
    }

    #[test]
    fn test_seeker_denied_employer_surface_lands_on_own_dashboard() {
        assert_eq!(
            decide(&signed_in(Role::JobSeeker), Some(&[Role::Employer])),
            Decision::RedirectTo(SEEKER_DASHBOARD)
        );
    }

    #[test]
    fn test_canonical_home_mapping() {
        assert_eq!(canonical_home(Role::JobSeeker), "/dashboard");
        assert_eq!(canonical_home(Role::Employer), "/employer/dashboard");
        assert_eq!(canonical_home(Role::Admin), "/admin/dashboard");
        assert_eq!(canonical_home(Role::Unknown), "/");
    }

    #[test]
    fn test_post_verify_route_defaults_to_dashboard() {
        assert_eq!(post_verify_route(Role::Employer), "/employer/dashboard");
        assert_eq!(post_verify_route(Role::Admin), "/admin/dashboard");
        assert_eq!(post_verify_route(Role::JobSeeker), "/dashboard");
        assert_eq!(post_verify_route(Role::Unknown), "/dashboard");
    }

    #[test]
    fn test_decide_is_deterministic() {
        let state = signed_in(Role::Employer);
        let required = Some(&[Role::Admin][..]);
        let first = decide(&state, required);
        for _ in 0..10 {
            assert_eq!(decide(&state, required), first);
        }
    }
}

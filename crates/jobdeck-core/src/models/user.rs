use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse-grained account classification assigned by the server.
///
/// Role strings the API has not documented deserialize to `Unknown` instead
/// of failing the whole payload; gating code treats `Unknown` as "no surface
/// of its own".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Employer,
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "job_seeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }

    /// Parse a role string the way the wire does: anything unrecognized is
    /// `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "job_seeker" => Role::JobSeeker,
            "employer" => Role::Employer,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }

    /// Human-readable label for status bars and headers.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Role::JobSeeker => "Job Seeker",
            Role::Employer => "Employer",
            Role::Admin => "Administrator",
            Role::Unknown => "Member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The session's user as returned by the authentication endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(rename = "isVerified", default)]
    pub is_verified: Option<bool>,
}

impl User {
    /// Name to show in the UI, falling back to the account email.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Successful authentication payload: the bearer token plus its user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::JobSeeker, Role::Employer, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), role);
        }
    }

    #[test]
    fn test_role_parse_unrecognized() {
        assert_eq!(Role::parse("recruiter"), Role::Unknown);
        assert_eq!(Role::parse(""), Role::Unknown);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::JobSeeker.to_string(), "job_seeker");
        assert_eq!(Role::Employer.to_string(), "employer");
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_role_deserializes_unknown_variants() {
        let role: Role = serde_json::from_str("\"superuser\"").expect("role should parse");
        assert_eq!(role, Role::Unknown);
    }

    #[test]
    fn test_user_parses_wire_shape() {
        let json = r#"{
            "_id": "665f1c2e9b1e8a0012ab34cd",
            "email": "dana@example.com",
            "name": "Dana",
            "role": "employer",
            "isVerified": true
        }"#;
        let user: User = serde_json::from_str(json).expect("user should parse");
        assert_eq!(user.role, Role::Employer);
        assert_eq!(user.display_name(), "Dana");
        assert_eq!(user.is_verified, Some(true));
    }

    #[test]
    fn test_user_display_name_falls_back_to_email() {
        let json = r#"{"id": "u1", "email": "sam@example.com", "role": "job_seeker"}"#;
        let user: User = serde_json::from_str(json).expect("user should parse");
        assert_eq!(user.display_name(), "sam@example.com");
    }

    #[test]
    fn test_auth_payload_parses() {
        let json = r#"{
            "token": "eyJhbGciOiJIUzI1NiJ9.payload.sig",
            "user": {"_id": "u2", "email": "kim@example.com", "role": "admin"}
        }"#;
        let payload: AuthPayload = serde_json::from_str(json).expect("payload should parse");
        assert!(!payload.token.is_empty());
        assert_eq!(payload.user.role, Role::Admin);
    }
}

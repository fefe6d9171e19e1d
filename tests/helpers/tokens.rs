//! Token builders
//!
//! Tokens are real compact JWTs signed with a throwaway key. Eventus only
//! reads the payload, so the signature never matters.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

pub const ROLE_CLIENT: &str = "eventus-rest-api";

/// Sign arbitrary claims
pub fn token_with_claims(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"eventus-test-secret"),
    )
    .expect("failed to encode test token")
}

/// Token for `subject` holding `roles` on the role client
pub fn token_for(subject: &str, username: &str, roles: &[&str]) -> String {
    token_with_claims(&json!({
        "sub": subject,
        "preferred_username": username,
        "email": format!("{}@ifpb.edu.br", username),
        "exp": 4_102_444_800_i64,
        "resource_access": {
            ROLE_CLIENT: { "roles": roles }
        }
    }))
}

pub fn admin_token() -> String {
    token_for("admin-1", "coordenacao", &["admin"])
}

pub fn organizer_token() -> String {
    token_for("org-1", "organizadora", &["client_admin"])
}

pub fn attendee_token(subject: &str) -> String {
    token_for(subject, subject, &["client_user"])
}

/// Valid token shape without a `sub` claim
pub fn token_without_subject() -> String {
    token_with_claims(&json!({ "preferred_username": "anon" }))
}

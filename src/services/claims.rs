//! Token claims reader
//!
//! Reads the payload segment of a compact `header.payload.signature` token
//! without verifying its signature. Verification belongs to the identity
//! provider and the backend; this side only needs the caller's subject and
//! client roles to shape views.
//!
//! Decoding never fails loudly: any malformed input yields empty claims.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;

use crate::utils::logging::log_decode_failure;

/// Standard alphabet, padding optional
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Roles granted to the caller on one client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The subset of token claims this service reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub resource_access: HashMap<String, ClientAccess>,
}

impl TokenClaims {
    /// Roles for `client_id`, empty when the client is absent
    pub fn client_roles(&self, client_id: &str) -> &[String] {
        self.resource_access
            .get(client_id)
            .map(|access| access.roles.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        *self == TokenClaims::default()
    }
}

/// Decode the claims carried by `token`
pub fn decode_claims(token: &str) -> TokenClaims {
    match try_decode(token) {
        Ok(claims) => claims,
        Err(reason) => {
            log_decode_failure(&reason);
            TokenClaims::default()
        }
    }
}

fn try_decode(token: &str) -> std::result::Result<TokenClaims, String> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| "token has no payload segment".to_string())?;

    let standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE
        .decode(standard.as_bytes())
        .map_err(|e| format!("invalid base64 payload: {}", e))?;

    let mut escaped = String::with_capacity(bytes.len() * 3);
    for byte in &bytes {
        // Writing to a String cannot fail
        let _ = write!(escaped, "%{:02x}", byte);
    }

    let text = urlencoding::decode(&escaped).map_err(|e| format!("payload is not UTF-8: {}", e))?;

    serde_json::from_str(&text).map_err(|e| format!("payload is not a claims object: {}", e))
}

//! Principal and role models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Application role carried in the token's client roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ClientAdmin,
    ClientUser,
}

impl Role {
    /// Precedence order used when a token carries several roles
    pub const PRECEDENCE: [Role; 3] = [Role::Admin, Role::ClientAdmin, Role::ClientUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ClientAdmin => "client_admin",
            Role::ClientUser => "client_user",
        }
    }

    /// Admins and client admins organize events and see rosters
    pub fn is_organizer(&self) -> bool {
        matches!(self, Role::Admin | Role::ClientAdmin)
    }

    /// Highest-precedence role present in `roles`
    pub fn resolve<S: AsRef<str>>(roles: &[S]) -> Option<Role> {
        Role::PRECEDENCE
            .into_iter()
            .find(|role| roles.iter().any(|r| r.as_ref() == role.as_str()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "client_admin" => Ok(Role::ClientAdmin),
            "client_user" => Ok(Role::ClientUser),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The authenticated caller, derived from token claims once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub subject_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Self-service registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

impl RegisterUserRequest {
    /// Names of required fields left blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("username", &self.username),
            ("password", &self.password),
            ("role", &self.role),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_precedence() {
        assert_eq!(Role::resolve(&["client_user", "admin"]), Some(Role::Admin));
        assert_eq!(
            Role::resolve(&["client_user", "client_admin"]),
            Some(Role::ClientAdmin)
        );
        assert_eq!(Role::resolve(&["client_user"]), Some(Role::ClientUser));
        assert_eq!(Role::resolve::<&str>(&[]), None);
        assert_eq!(Role::resolve(&["offline_access"]), None);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::PRECEDENCE {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_missing_fields() {
        let request = RegisterUserRequest {
            first_name: "Ana".to_string(),
            email: "ana@ifpb.edu.br".to_string(),
            ..Default::default()
        };
        assert_eq!(
            request.missing_fields(),
            vec!["lastName", "username", "password", "role"]
        );
    }
}

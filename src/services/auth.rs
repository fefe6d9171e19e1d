//! Authentication service implementation
//!
//! Resolves the caller of a request from its bearer token and answers
//! permission questions by role. The token is read, never verified; the
//! backend remains the authority on what a token may do.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{Principal, Role};
use crate::services::claims::{decode_claims, TokenClaims};
use crate::utils::errors::{EventusError, Result};

/// Permission levels for different operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Browse events, activities and the calendar
    ViewEvents,
    /// Register for events and activities
    Register,
    /// Create, update and delete events and activities
    ManageEvents,
    /// See rosters and mark presence
    ManageAttendance,
    /// Export participant lists and plans
    ExportReports,
}

impl Permission {
    /// Permissions granted to a caller holding `role`
    pub fn for_role(role: Option<Role>) -> HashSet<Permission> {
        let mut permissions = HashSet::from([Permission::ViewEvents, Permission::Register]);
        if role.map(|r| r.is_organizer()).unwrap_or(false) {
            permissions.extend([
                Permission::ManageEvents,
                Permission::ManageAttendance,
                Permission::ExportReports,
            ]);
        }
        permissions
    }
}

/// Authentication context for one request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub permissions: HashSet<Permission>,
}

impl AuthContext {
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Require specific permission or return error
    pub fn require(&self, permission: Permission) -> Result<&Self> {
        if !self.has(permission) {
            warn!(
                subject_id = %self.principal.subject_id,
                role = ?self.principal.role,
                permission = ?permission,
                "Permission denied"
            );
            return Err(EventusError::PermissionDenied(format!(
                "{:?} requires admin or client_admin",
                permission
            )));
        }
        Ok(self)
    }
}

/// Authentication service for turning tokens into principals
#[derive(Debug, Clone)]
pub struct AuthService {
    role_client_id: String,
}

impl AuthService {
    /// `role_client_id` is the client whose roles carry the application role
    pub fn new(role_client_id: impl Into<String>) -> Self {
        Self {
            role_client_id: role_client_id.into(),
        }
    }

    /// Build the principal from already decoded claims
    ///
    /// Returns `None` when the claims carry no subject.
    pub fn principal_from_claims(&self, claims: &TokenClaims) -> Option<Principal> {
        let subject_id = claims.sub.clone().filter(|s| !s.is_empty())?;
        let role = Role::resolve(claims.client_roles(&self.role_client_id));
        Some(Principal {
            subject_id,
            username: claims.preferred_username.clone(),
            email: claims.email.clone(),
            role,
        })
    }

    /// Resolve the principal behind `token`
    pub fn principal(&self, token: &str) -> Option<Principal> {
        self.principal_from_claims(&decode_claims(token))
    }

    /// Get authentication context for a token
    pub fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let principal = self.principal(token).ok_or_else(|| {
            EventusError::Authentication("token carries no subject".to_string())
        })?;
        let permissions = Permission::for_role(principal.role);

        debug!(
            subject_id = %principal.subject_id,
            role = ?principal.role,
            "Authentication context created"
        );
        Ok(AuthContext {
            principal,
            permissions,
        })
    }

    /// Authenticate and require `permission` in one step
    pub fn require_permission(&self, token: &str, permission: Permission) -> Result<AuthContext> {
        let context = self.authenticate(token)?;
        context.require(permission)?;
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    use crate::services::claims::ClientAccess;

    fn claims(sub: Option<&str>, roles: &[&str]) -> TokenClaims {
        TokenClaims {
            sub: sub.map(str::to_string),
            preferred_username: Some("ana".to_string()),
            resource_access: HashMap::from([(
                "eventus-rest-api".to_string(),
                ClientAccess {
                    roles: roles.iter().map(|r| r.to_string()).collect(),
                },
            )]),
            ..Default::default()
        }
    }

    #[test]
    fn test_principal_uses_configured_client() {
        let service = AuthService::new("eventus-rest-api");
        let principal = service
            .principal_from_claims(&claims(Some("u1"), &["client_user", "client_admin"]))
            .unwrap();
        assert_eq!(principal.role, Some(Role::ClientAdmin));

        let other = AuthService::new("another-client");
        let principal = other
            .principal_from_claims(&claims(Some("u1"), &["admin"]))
            .unwrap();
        assert_eq!(principal.role, None);
    }

    #[test]
    fn test_empty_claims_have_no_principal() {
        let service = AuthService::new("eventus-rest-api");
        assert!(service.principal_from_claims(&TokenClaims::default()).is_none());
        assert!(service.principal_from_claims(&claims(Some(""), &[])).is_none());
        assert_matches!(
            service.authenticate("garbage"),
            Err(EventusError::Authentication(_))
        );
    }

    #[test]
    fn test_permissions_by_role() {
        let user = Permission::for_role(Some(Role::ClientUser));
        assert!(user.contains(&Permission::Register));
        assert!(!user.contains(&Permission::ManageAttendance));

        let no_role = Permission::for_role(None);
        assert_eq!(no_role, user);

        for role in [Role::Admin, Role::ClientAdmin] {
            let organizer = Permission::for_role(Some(role));
            assert!(organizer.contains(&Permission::ManageEvents));
            assert!(organizer.contains(&Permission::ExportReports));
        }
    }

    #[test]
    fn test_require_rejects_missing_permission() {
        let context = AuthContext {
            principal: Principal {
                subject_id: "u1".to_string(),
                username: None,
                email: None,
                role: Some(Role::ClientUser),
            },
            permissions: Permission::for_role(Some(Role::ClientUser)),
        };
        assert_matches!(
            context.require(Permission::ManageEvents),
            Err(EventusError::PermissionDenied(_))
        );
        assert!(context.require(Permission::ViewEvents).is_ok());
    }
}

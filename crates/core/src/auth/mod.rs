//! Authentication and authorization rules.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - User roles and what each one may do

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Maintains users, categories and budget entries; submits entries.
    Admin,
    /// Approves or rejects submitted entries.
    Gestor,
    /// Read-only access.
    Visualizador,
}

impl Role {
    /// All roles.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Gestor, Self::Visualizador];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Gestor => "gestor",
            Self::Visualizador => "visualizador",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "gestor" => Some(Self::Gestor),
            "visualizador" => Some(Self::Visualizador),
            _ => None,
        }
    }

    /// Returns true if this role can create, update and delete users.
    #[must_use]
    pub const fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can create, update, import and delete categories.
    #[must_use]
    pub const fn can_manage_categories(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can create budget entries.
    #[must_use]
    pub const fn can_create_entries(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can change the planned amount of an entry.
    #[must_use]
    pub const fn can_edit_planned(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can use the batch edit endpoint.
    #[must_use]
    pub const fn can_batch_edit(self) -> bool {
        matches!(self, Self::Admin | Self::Gestor)
    }

    /// Returns true if this role can delete budget entries.
    #[must_use]
    pub const fn can_delete_entries(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can submit entries for approval.
    #[must_use]
    pub const fn can_submit(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can approve entries.
    #[must_use]
    pub const fn can_approve(self) -> bool {
        matches!(self, Self::Gestor)
    }

    /// Returns true if this role can reject entries.
    #[must_use]
    pub const fn can_reject(self) -> bool {
        matches!(self, Self::Admin | Self::Gestor)
    }

    /// Returns true if this role can list batch submissions awaiting approval.
    #[must_use]
    pub const fn can_view_submissions(self) -> bool {
        matches!(self, Self::Gestor)
    }

    /// Returns true if this role can list rejections.
    #[must_use]
    pub const fn can_view_rejections(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can read the audit log.
    #[must_use]
    pub const fn can_view_logs(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("GESTOR"), Some(Role::Gestor));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_admin_permissions() {
        let role = Role::Admin;
        assert!(role.can_manage_users());
        assert!(role.can_manage_categories());
        assert!(role.can_create_entries());
        assert!(role.can_edit_planned());
        assert!(role.can_batch_edit());
        assert!(role.can_submit());
        assert!(role.can_reject());
        assert!(role.can_view_rejections());
        assert!(role.can_view_logs());
        assert!(!role.can_approve());
        assert!(!role.can_view_submissions());
    }

    #[test]
    fn test_gestor_permissions() {
        let role = Role::Gestor;
        assert!(role.can_approve());
        assert!(role.can_reject());
        assert!(role.can_batch_edit());
        assert!(role.can_view_submissions());
        assert!(!role.can_submit());
        assert!(!role.can_create_entries());
        assert!(!role.can_edit_planned());
        assert!(!role.can_manage_users());
        assert!(!role.can_view_logs());
    }

    #[test]
    fn test_visualizador_is_read_only() {
        let role = Role::Visualizador;
        assert!(!role.can_manage_users());
        assert!(!role.can_manage_categories());
        assert!(!role.can_create_entries());
        assert!(!role.can_batch_edit());
        assert!(!role.can_delete_entries());
        assert!(!role.can_submit());
        assert!(!role.can_approve());
        assert!(!role.can_reject());
        assert!(!role.can_view_logs());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Gestor).unwrap(), "\"gestor\"");
        let role: Role = serde_json::from_str("\"visualizador\"").unwrap();
        assert_eq!(role, Role::Visualizador);
    }
}

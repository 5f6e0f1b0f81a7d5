//! Account roles and the capabilities they grant.

use serde::{Deserialize, Serialize};

/// Account role.
///
/// Stored in Postgres as the `doacoes.user_role` enum and serialized as
/// `"ADMIN"` / `"GERENTE"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "doacoes.user_role", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Manages accounts and every record.
    Admin,
    /// Day-to-day operation: donors, recipients, items and donations.
    #[default]
    Gerente,
}

/// Something a request may need permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create, update and delete accounts.
    ManageUsers,
    /// Run the donation wizard.
    RegisterDonations,
    /// CRUD over donors, recipients, items and donations.
    ManageRecords,
    /// See the dashboard.
    ViewDashboard,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Self; 2] = [Self::Admin, Self::Gerente];

    /// Whether this role grants `capability`.
    ///
    /// This is the only place role permissions are decided; extractors and
    /// handlers ask this function instead of matching on roles themselves.
    #[must_use]
    pub const fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::ManageUsers => matches!(self, Self::Admin),
            Capability::RegisterDonations
            | Capability::ManageRecords
            | Capability::ViewDashboard => true,
        }
    }

    /// Wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Gerente => "GERENTE",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrador",
            Self::Gerente => "Gerente",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "GERENTE" => Ok(Self::Gerente),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_every_capability() {
        for capability in [
            Capability::ManageUsers,
            Capability::RegisterDonations,
            Capability::ManageRecords,
            Capability::ViewDashboard,
        ] {
            assert!(Role::Admin.can(capability), "{capability:?}");
        }
    }

    #[test]
    fn test_gerente_cannot_manage_users() {
        assert!(!Role::Gerente.can(Capability::ManageUsers));
        assert!(Role::Gerente.can(Capability::RegisterDonations));
        assert!(Role::Gerente.can(Capability::ManageRecords));
        assert!(Role::Gerente.can(Capability::ViewDashboard));
    }

    #[test]
    fn test_default_is_gerente() {
        assert_eq!(Role::default(), Role::Gerente);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("GERENTE".parse::<Role>().unwrap(), Role::Gerente);
        assert!("viewer".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn test_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Gerente).unwrap(), "\"GERENTE\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}

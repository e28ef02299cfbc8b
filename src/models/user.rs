use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed role set. Lowest privilege is the default; role claims are
/// carried in session tokens but mutations are not role-gated server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Employee
    }
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
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
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Soft-delete state as a single tagged value. The two database columns
/// (is_deleted, deleted_at) are joined here at the repository boundary so
/// the invalid combination "not deleted but deleted_at set" cannot be
/// represented in the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted { at: String },
}

impl Lifecycle {
    #[must_use]
    pub fn from_columns(is_deleted: bool, deleted_at: Option<String>) -> Self {
        if is_deleted {
            Self::Deleted {
                at: deleted_at.unwrap_or_default(),
            }
        } else {
            Self::Active
        }
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    #[must_use]
    pub fn deleted_at(&self) -> Option<&str> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(at),
        }
    }
}

/// Domain user. The password hash never leaves the repository layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub active: bool,
    pub lifecycle: Lifecycle,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_lifecycle_from_columns() {
        assert_eq!(Lifecycle::from_columns(false, None), Lifecycle::Active);
        // A stray deleted_at on a live row is dropped, not surfaced.
        assert_eq!(
            Lifecycle::from_columns(false, Some("2026-01-01T00:00:00Z".into())),
            Lifecycle::Active
        );
        let deleted = Lifecycle::from_columns(true, Some("2026-01-01T00:00:00Z".into()));
        assert!(deleted.is_deleted());
        assert_eq!(deleted.deleted_at(), Some("2026-01-01T00:00:00Z"));
    }
}

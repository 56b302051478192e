//! Models that represent employee accounts and role metadata.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of an employee account.
pub struct User {
    pub id: UserId,
    /// Human-facing employee number (payroll key).
    pub emp_id: String,
    /// Immutable username used for login.
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    /// Manager notified when this employee's records are flagged.
    pub manager_id: Option<UserId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    #[default]
    Employee,
    Manager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    pub fn is_manager(&self) -> bool {
        matches!(self.role, UserRole::Manager | UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_as_str_matches_db_values() {
        assert_eq!(UserRole::Employee.as_str(), "employee");
        assert_eq!(UserRole::Manager.as_str(), "manager");
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn admins_count_as_managers() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            emp_id: "E042".into(),
            username: "gita".into(),
            full_name: "Gita Rao".into(),
            role: UserRole::Admin,
            manager_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(user.is_admin());
        assert!(user.is_manager());
    }
}

use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::users;

/// Account roles. Stored as lowercase text in the `role` column;
/// parse at the boundary with [`Role::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Hr,
    TechLead,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::TechLead => "tech_lead",
            Role::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "hr" => Some(Role::Hr),
            "tech_lead" => Some(Role::TechLead),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    /// Manager-capable roles may own employee records and approve requests.
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }

    /// Tech-capable roles may act on technical-onboarding specifics.
    pub fn is_tech_approver(&self) -> bool {
        matches!(self, Role::Admin | Role::TechLead)
    }
}

#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = users)]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String, // Stored normalized: trimmed + lowercased, unique
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub reset_token_digest: Option<String>,
    #[ts(type = "string | null")]
    pub reset_token_expires: Option<NaiveDateTime>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Employee)
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            active: self.active,
        }
    }
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// For API inputs and validation
#[derive(Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Projection safe to return to clients. Never carries the password hash
/// or reset-token fields.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Admin, Role::Hr, Role::TechLead, Role::Employee] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("supervisor"), None);
    }

    #[test]
    fn manager_predicate_covers_admin_and_hr() {
        assert!(Role::Admin.is_manager());
        assert!(Role::Hr.is_manager());
        assert!(!Role::TechLead.is_manager());
        assert!(!Role::Employee.is_manager());
    }

    #[test]
    fn tech_predicate_covers_admin_and_tech_lead() {
        assert!(Role::Admin.is_tech_approver());
        assert!(Role::TechLead.is_tech_approver());
        assert!(!Role::Hr.is_tech_approver());
    }
}

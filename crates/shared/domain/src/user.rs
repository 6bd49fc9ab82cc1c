//! User identity entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_APPLICANT, ROLE_EMPLOYER, STATUS_ACTIVE, STATUS_SUSPENDED};
use crate::error::DomainError;

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Applicant,
    Employer,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Parse a stored or submitted role value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ROLE_APPLICANT => Some(UserRole::Applicant),
            ROLE_EMPLOYER => Some(UserRole::Employer),
            ROLE_ADMIN => Some(UserRole::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Applicant => ROLE_APPLICANT,
            UserRole::Employer => ROLE_EMPLOYER,
            UserRole::Admin => ROLE_ADMIN,
        }
    }

    /// Whether the role is in the given set.
    pub fn is_one_of(&self, roles: &[UserRole]) -> bool {
        roles.contains(self)
    }
}

impl TryFrom<&str> for UserRole {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        UserRole::parse(s).ok_or_else(|| DomainError::validation(format!("Unknown role '{}'", s)))
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account status. Suspension is the only way an account is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            STATUS_ACTIVE => Some(UserStatus::Active),
            STATUS_SUSPENDED => Some(UserStatus::Suspended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => STATUS_ACTIVE,
            UserStatus::Suspended => STATUS_SUSPENDED,
        }
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        UserStatus::parse(s)
            .ok_or_else(|| DomainError::validation(format!("Unknown account status '{}'", s)))
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User identity entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user
    pub fn new(id: Uuid, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            display_name: None,
            role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if the account may sign in
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Update display name
    pub fn update_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
        self.updated_at = Utc::now();
    }

    /// Change account status
    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address
    pub email: String,
    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// User role
    pub role: String,
    /// Account status
    pub status: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at,
        }
    }
}

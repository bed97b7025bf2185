//! Doctor accounts and login sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A doctor allowed to sign in to the portal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorAccount {
    /// Local UUID
    pub id: String,
    /// Display name; also the `dentist_name` on the doctor's cases
    pub name: String,
    /// `pbkdf2-sha256$<iterations>$<hex key>`
    pub password_hash: String,
    /// Per-account random salt
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

/// What a signed-in user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Lab owner: every case, user management
    Owner,
    /// Affiliated doctor: own cases only
    Doctor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Doctor => write!(f, "doctor"),
        }
    }
}

/// Explicit login context handed to whatever serves a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_name: String,
    pub role: Role,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn owner(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            role: Role::Owner,
            started_at: Utc::now(),
        }
    }

    pub fn doctor(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            role: Role::Doctor,
            started_at: Utc::now(),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Dentist filter for case listings: `None` means every case.
    pub fn dentist_scope(&self) -> Option<&str> {
        match self.role {
            Role::Owner => None,
            Role::Doctor => Some(&self.user_name),
        }
    }
}

//! Doctor and owner sign-in.

use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::db::{Database, DbError};
use crate::models::{DoctorAccount, Session};
use crate::validation::{validate_doctor, ValidationError};

/// User name carried by owner sessions.
pub const OWNER_USER_NAME: &str = "owner";

/// PBKDF2 rounds for newly stored doctor passwords.
pub const PASSWORD_ITERATIONS: u32 = 200_000;

const HASH_SCHEME: &str = "pbkdf2-sha256";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("A doctor named {0} already exists")]
    DuplicateUser(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Compute SHA-256 hash of data as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a password with its account salt.
///
/// Stored as `pbkdf2-sha256$<iterations>$<hex key>` so the round count
/// travels with the hash.
pub fn hash_password(salt: &str, password: &str, iterations: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    format!("{}${}${}", HASH_SCHEME, iterations, hex::encode(key))
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(salt: &str, password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(HASH_SCHEME), Some(iterations), Some(_)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    constant_time_eq(
        hash_password(salt, password, iterations).as_bytes(),
        stored.as_bytes(),
    )
}

/// Byte comparison whose running time does not depend on where inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Create a doctor account after validating the add-doctor form.
pub fn register_doctor(db: &Database, name: &str, password: &str) -> AuthResult<DoctorAccount> {
    validate_doctor(name, password)?;
    let name = name.trim();

    if db.get_user_by_name(name)?.is_some() {
        return Err(AuthError::DuplicateUser(name.to_string()));
    }

    let salt = uuid::Uuid::new_v4().to_string();
    let account = DoctorAccount {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        password_hash: hash_password(&salt, password, PASSWORD_ITERATIONS),
        salt,
        created_at: Utc::now(),
    };

    match db.insert_user(&account) {
        Ok(()) => {}
        Err(DbError::Constraint(_)) => return Err(AuthError::DuplicateUser(account.name)),
        Err(e) => return Err(e.into()),
    }
    info!(name = %account.name, "registered doctor");
    Ok(account)
}

/// Check a doctor's credentials. Unknown name and wrong password both give `None`.
pub fn authenticate_doctor(db: &Database, name: &str, password: &str) -> AuthResult<Option<Session>> {
    let Some(account) = db.get_user_by_name(name.trim())? else {
        warn!(name, "login failed: unknown doctor");
        return Ok(None);
    };

    if !verify_password(&account.salt, password, &account.password_hash) {
        warn!(name, "login failed: wrong password");
        return Ok(None);
    }

    info!(name = %account.name, "doctor signed in");
    Ok(Some(Session::doctor(account.name)))
}

/// Check the owner password against the configured hash.
///
/// Always `None` when no owner password is configured.
pub fn authenticate_owner(config: &AuthConfig, password: &str) -> Option<Session> {
    let expected = config.owner_password_sha256.as_deref()?.trim().to_ascii_lowercase();
    if constant_time_eq(sha256_hex(password.as_bytes()).as_bytes(), expected.as_bytes()) {
        info!("owner signed in");
        Some(Session::owner(OWNER_USER_NAME))
    } else {
        warn!("login failed: wrong owner password");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_hash_password_is_salted() {
        let a = hash_password("salt-a", "secret1", 1_000);
        let b = hash_password("salt-b", "secret1", 1_000);
        assert!(a.starts_with("pbkdf2-sha256$1000$"));
        assert_eq!(a.rsplit('$').next().map(str::len), Some(64));
        assert_ne!(a, b);
        assert_eq!(a, hash_password("salt-a", "secret1", 1_000));
    }

    #[test]
    fn test_verify_password() {
        let stored = hash_password("salt-a", "secret1", 1_000);
        assert!(verify_password("salt-a", "secret1", &stored));
        assert!(!verify_password("salt-a", "secret2", &stored));
        assert!(!verify_password("salt-b", "secret1", &stored));

        // Unsalted SHA-256 and broken records are refused
        assert!(!verify_password("salt-a", "secret1", &sha256_hex(b"salt-asecret1")));
        assert!(!verify_password("salt-a", "secret1", "pbkdf2-sha256$0$00"));
        assert!(!verify_password("salt-a", "secret1", "pbkdf2-sha256$many$00"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_register_and_login() {
        let db = Database::open_in_memory().unwrap();
        let account = register_doctor(&db, "Dr. Smith", "secret1").unwrap();
        assert_ne!(account.password_hash, "secret1");

        let session = authenticate_doctor(&db, "Dr. Smith", "secret1").unwrap().unwrap();
        assert_eq!(session.role, Role::Doctor);
        assert_eq!(session.dentist_scope(), Some("Dr. Smith"));

        assert!(authenticate_doctor(&db, "Dr. Smith", "wrong!!").unwrap().is_none());
        assert!(authenticate_doctor(&db, "Dr. Nobody", "secret1").unwrap().is_none());
    }

    #[test]
    fn test_register_duplicate() {
        let db = Database::open_in_memory().unwrap();
        register_doctor(&db, "Dr. Smith", "secret1").unwrap();
        let err = register_doctor(&db, "Dr. Smith", "another").unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUser(_)));
    }

    #[test]
    fn test_register_invalid() {
        let db = Database::open_in_memory().unwrap();
        let err = register_doctor(&db, "D", "123").unwrap_err();
        match err {
            AuthError::Invalid(v) => assert_eq!(v.failures.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(db.list_users().unwrap().is_empty());
    }

    #[test]
    fn test_owner_login() {
        let config = AuthConfig {
            owner_password_sha256: Some(sha256_hex(b"lab-owner")),
        };
        let session = authenticate_owner(&config, "lab-owner").unwrap();
        assert!(session.is_owner());
        assert!(authenticate_owner(&config, "nope").is_none());
        assert!(authenticate_owner(&AuthConfig::default(), "lab-owner").is_none());

        let upper = AuthConfig {
            owner_password_sha256: Some(sha256_hex(b"lab-owner").to_uppercase()),
        };
        assert!(authenticate_owner(&upper, "lab-owner").is_some());
    }
}

//! Doctor account operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{Database, DbError, DbResult};
use crate::models::DoctorAccount;

impl Database {
    /// Insert a doctor account. Names are unique.
    pub fn insert_user(&self, user: &DoctorAccount) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO doctors (id, name, password_hash, salt, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                user.id,
                user.name,
                user.password_hash,
                user.salt,
                user.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                debug!(name = %user.name, "inserted doctor account");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DbError::Constraint(format!(
                    "doctor {} already exists",
                    user.name
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a doctor by exact name.
    pub fn get_user_by_name(&self, name: &str) -> DbResult<Option<DoctorAccount>> {
        self.conn
            .query_row(
                "SELECT id, name, password_hash, salt, created_at FROM doctors WHERE name = ?",
                [name],
                UserRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All doctor accounts, by name.
    pub fn list_users(&self) -> DbResult<Vec<DoctorAccount>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, password_hash, salt, created_at FROM doctors ORDER BY name",
        )?;

        let rows = stmt.query_map([], UserRow::from_row)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?.try_into()?);
        }
        Ok(users)
    }

    /// Delete a doctor account by ID. Their cases are left untouched.
    pub fn delete_user(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM doctors WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

struct UserRow {
    id: String,
    name: String,
    password_hash: String,
    salt: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserRow {
            id: row.get(0)?,
            name: row.get(1)?,
            password_hash: row.get(2)?,
            salt: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl TryFrom<UserRow> for DoctorAccount {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DbError::Constraint(format!("Bad created_at {}: {}", row.created_at, e)))?
            .with_timezone(&Utc);

        Ok(DoctorAccount {
            id: row.id,
            name: row.name,
            password_hash: row.password_hash,
            salt: row.salt,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> DoctorAccount {
        DoctorAccount {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            password_hash: "ab".repeat(32),
            salt: "salt".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let user = account("Dr. Smith");
        db.insert_user(&user).unwrap();

        let found = db.get_user_by_name("Dr. Smith").unwrap().unwrap();
        assert_eq!(found, user);
        assert!(db.get_user_by_name("dr. smith").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&account("Dr. Smith")).unwrap();

        let result = db.insert_user(&account("Dr. Smith"));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_list_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let b = account("Dr. B");
        db.insert_user(&b).unwrap();
        db.insert_user(&account("Dr. A")).unwrap();

        let names: Vec<_> = db.list_users().unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Dr. A", "Dr. B"]);

        assert!(db.delete_user(&b.id).unwrap());
        assert!(!db.delete_user(&b.id).unwrap());
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}

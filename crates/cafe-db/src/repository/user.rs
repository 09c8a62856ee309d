//! # User Repository
//!
//! Register accounts, roles and password checks.
//!
//! Passwords are stored as argon2 PHC strings. The hash never leaves this
//! module: every public method returns [`User`], which has no hash field.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use cafe_core::{NewUser, Role, User, UserUpdate, DEFAULT_ADMIN_USERNAME};

/// A users row including the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: Role,
    created_at: NaiveDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Checks a username/password pair.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - Credentials match
    /// * `Ok(None)` - Unknown user or wrong password (indistinguishable)
    pub async fn login(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) if verify_password(password, &row.password_hash) => {
                info!(user_id = row.id, username = %row.username, "User logged in");
                Ok(Some(row.into()))
            }
            _ => {
                warn!(username = %username.trim(), "Failed login attempt");
                Ok(None)
            }
        }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, role, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, role, created_at FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Counts users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Creates a user.
    ///
    /// ## Returns
    /// * `Ok(User)` - The new user
    /// * `Err(DbError::UniqueViolation)` - Username taken
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        let username = user.username.trim();
        debug!(username = %username, role = %user.role, "Creating user");

        let hash = hash_password(&user.password)?;

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(&hash)
        .bind(user.role)
        .execute(&self.pool)
        .await
        .map_err(|e| username_conflict(e, username))?;

        let id = result.last_insert_rowid();
        info!(user_id = id, username = %username, "User created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Updates a user's name and role, and the password when one is given.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> DbResult<User> {
        let username = update.username.trim();
        debug!(user_id = id, username = %username, "Updating user");

        let password_hash = update
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(hash_password)
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = ?2,
                role = ?3,
                password_hash = COALESCE(?4, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(update.role)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| username_conflict(e, username))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes a user.
    ///
    /// The last remaining user can't be deleted, and neither can a user who
    /// has taken orders.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        if count <= 1 {
            return Err(DbError::Conflict("Cannot delete the last user".to_string()));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => {
                    DbError::Conflict("User has orders and cannot be deleted".to_string())
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Creates the `admin` account when there are no users at all.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - The admin was just created
    /// * `Ok(None)` - Users already exist; nothing changed
    pub async fn ensure_default_admin(&self, password: &str) -> DbResult<Option<User>> {
        if self.count().await? > 0 {
            debug!("Users exist, skipping default admin");
            return Ok(None);
        }

        let admin = self
            .create(&NewUser {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                password: password.to_string(),
                role: Role::Admin,
            })
            .await?;

        warn!(username = %admin.username, "Created default admin account; change its password");
        Ok(Some(admin))
    }
}

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn username_conflict(err: sqlx::Error, username: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cashier(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password: "secret1".to_string(),
            role: Role::Cashier,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_default_admin_created_once() {
        let db = db().await;
        let users = db.users();

        let admin = users.ensure_default_admin("admin123").await.unwrap().unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.role, Role::Admin);

        assert!(users.ensure_default_admin("other").await.unwrap().is_none());
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login() {
        let db = db().await;
        let users = db.users();
        users.create(&cashier("sara")).await.unwrap();

        let user = users.login("sara", "secret1").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Cashier);

        assert!(users.login("sara", "wrong").await.unwrap().is_none());
        assert!(users.login("nobody", "secret1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = db().await;
        let users = db.users();
        users.create(&cashier("sara")).await.unwrap();

        let err = users.create(&cashier("sara")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_absent() {
        let db = db().await;
        let users = db.users();
        let user = users.create(&cashier("sara")).await.unwrap();

        let updated = users
            .update(
                user.id,
                &UserUpdate {
                    username: "sara.k".to_string(),
                    role: Role::Admin,
                    password: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "sara.k");
        assert_eq!(updated.role, Role::Admin);
        assert!(users.login("sara.k", "secret1").await.unwrap().is_some());

        users
            .update(
                user.id,
                &UserUpdate {
                    username: "sara.k".to_string(),
                    role: Role::Admin,
                    password: Some("newpass".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(users.login("sara.k", "newpass").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cannot_delete_last_user() {
        let db = db().await;
        let users = db.users();
        let admin = users.ensure_default_admin("admin123").await.unwrap().unwrap();

        let err = users.delete(admin.id).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let sara = users.create(&cashier("sara")).await.unwrap();
        users.delete(sara.id).await.unwrap();
        assert_eq!(users.count().await.unwrap(), 1);
    }
}

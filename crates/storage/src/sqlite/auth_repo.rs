use arena_core::model::{UserId, normalize_email};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db_err, ser, user_id_from_str};
use crate::auth::{digests_match, hash_password};
use crate::repository::{AuthBackend, StorageError};

#[async_trait::async_trait]
impl AuthBackend for SqliteRepository {
    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, StorageError> {
        let email = normalize_email(email).map_err(ser)?;
        let uid = UserId::generate();

        sqlx::query("INSERT INTO accounts (uid, email, password_hash) VALUES (?1, ?2, ?3)")
            .bind(uid.to_string())
            .bind(email)
            .bind(hash_password(uid, password))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(uid)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<UserId, StorageError> {
        let email = normalize_email(email).map_err(|_| StorageError::Unauthorized)?;

        let row = sqlx::query("SELECT uid, password_hash FROM accounts WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(StorageError::Unauthorized)?;

        let uid = user_id_from_str(&row.try_get::<String, _>("uid").map_err(ser)?)?;
        let stored: String = row.try_get("password_hash").map_err(ser)?;
        if digests_match(&stored, &hash_password(uid, password)) {
            Ok(uid)
        } else {
            Err(StorageError::Unauthorized)
        }
    }
}

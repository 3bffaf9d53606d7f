use arena_core::model::{UserId, UserProfile};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_profile_row};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let school_id = profile
            .school_id()
            .map(|s| id_to_i64("school_id", s.value()))
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO users (uid, email, full_name, school_id, school_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(uid) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name,
                school_id = excluded.school_id,
                school_name = excluded.school_name
            ",
        )
        .bind(profile.uid().to_string())
        .bind(profile.email().to_owned())
        .bind(profile.full_name().to_owned())
        .bind(school_id)
        .bind(profile.school_name().to_owned())
        .bind(profile.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_profile(&self, uid: UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT uid, email, full_name, school_id, school_name, created_at
            FROM users WHERE uid = ?1
            ",
        )
        .bind(uid.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT uid, email, full_name, school_id, school_name, created_at
            FROM users
            ORDER BY created_at ASC, email ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_profile_row).collect()
    }
}

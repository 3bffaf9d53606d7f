use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
            access_level TEXT NOT NULL CHECK (access_level IN ('public', 'private', 'draft')),
            code TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            chapter_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_answer INTEGER NOT NULL CHECK (correct_answer >= 0),
            damage INTEGER NOT NULL CHECK (damage >= 0),
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS schools (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            region TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS cheat_sheets (
            id INTEGER PRIMARY KEY,
            chapter_id INTEGER NOT NULL,
            title TEXT,
            image TEXT NOT NULL,
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS accounts (
            uid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS users (
            uid TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            full_name TEXT NOT NULL,
            school_id INTEGER,
            school_name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (school_id) REFERENCES schools(id) ON DELETE SET NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS battle_records (
            id INTEGER PRIMARY KEY,
            chapter_id INTEGER,
            player TEXT,
            state TEXT NOT NULL CHECK (state IN ('won', 'lost')),
            correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
            total_questions INTEGER NOT NULL CHECK (total_questions > 0),
            final_score INTEGER NOT NULL CHECK (final_score >= 0),
            completed_at TEXT NOT NULL,
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE SET NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_chapter
            ON questions (chapter_id, id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_cheat_sheets_chapter
            ON cheat_sheets (chapter_id, id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_battle_records_player_completed
            ON battle_records (player, completed_at);
    ",
];

/// Applies pending schema versions, each inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        tracing::debug!(version = 1, "applying sqlite migration");
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}

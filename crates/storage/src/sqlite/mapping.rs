use arena_core::battle::BattleState;
use arena_core::model::{
    AccessCode, AccessLevel, BattleRecord, BattleRecordId, Chapter, ChapterId, CheatSheet,
    CheatSheetId, Difficulty, Question, QuestionId, School, SchoolId, UserId, UserProfile,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, surfacing constraint violations as domain errors.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn chapter_id_from_i64(v: i64) -> Result<ChapterId, StorageError> {
    Ok(ChapterId::new(i64_to_u64("chapter_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn school_id_from_i64(v: i64) -> Result<SchoolId, StorageError> {
    Ok(SchoolId::new(i64_to_u64("school_id", v)?))
}

pub(crate) fn cheat_sheet_id_from_i64(v: i64) -> Result<CheatSheetId, StorageError> {
    Ok(CheatSheetId::new(i64_to_u64("cheat_sheet_id", v)?))
}

pub(crate) fn battle_record_id_from_i64(v: i64) -> Result<BattleRecordId, StorageError> {
    Ok(BattleRecordId::new(i64_to_u64("battle_record_id", v)?))
}

pub(crate) fn user_id_from_str(v: &str) -> Result<UserId, StorageError> {
    v.parse().map_err(ser)
}

pub(crate) fn map_chapter_row(row: &SqliteRow) -> Result<Chapter, StorageError> {
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let access_level: AccessLevel = row
        .try_get::<String, _>("access_level")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let code = AccessCode::parse(row.try_get::<String, _>("code").map_err(ser)?).map_err(ser)?;

    Chapter::from_persisted(
        chapter_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        difficulty,
        access_level,
        code,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct: i64 = row.try_get("correct_answer").map_err(ser)?;
    let correct_answer = usize::try_from(correct)
        .map_err(|_| StorageError::Serialization(format!("invalid correct_answer: {correct}")))?;

    Question::from_persisted(
        question_id_from_i64(row.try_get("id").map_err(ser)?)?,
        chapter_id_from_i64(row.try_get("chapter_id").map_err(ser)?)?,
        row.try_get::<String, _>("text").map_err(ser)?,
        options,
        correct_answer,
        i64_to_u32("damage", row.try_get("damage").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_school_row(row: &SqliteRow) -> Result<School, StorageError> {
    School::new(
        school_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("region").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_cheat_sheet_row(row: &SqliteRow) -> Result<CheatSheet, StorageError> {
    CheatSheet::new(
        cheat_sheet_id_from_i64(row.try_get("id").map_err(ser)?)?,
        chapter_id_from_i64(row.try_get("chapter_id").map_err(ser)?)?,
        row.try_get::<Option<String>, _>("title").map_err(ser)?,
        row.try_get::<String, _>("image").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<UserProfile, StorageError> {
    let uid: String = row.try_get("uid").map_err(ser)?;
    let email: String = row.try_get("email").map_err(ser)?;
    UserProfile::new(
        user_id_from_str(&uid)?,
        &email,
        row.try_get::<String, _>("full_name").map_err(ser)?,
        row.try_get::<Option<i64>, _>("school_id")
            .map_err(ser)?
            .map(school_id_from_i64)
            .transpose()?,
        row.try_get::<String, _>("school_name").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_battle_record_row(
    row: &SqliteRow,
) -> Result<(BattleRecordId, BattleRecord), StorageError> {
    let state: BattleState = row
        .try_get::<String, _>("state")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let player = row
        .try_get::<Option<String>, _>("player")
        .map_err(ser)?
        .as_deref()
        .map(user_id_from_str)
        .transpose()?;

    let record = BattleRecord::from_persisted(
        row.try_get::<Option<i64>, _>("chapter_id")
            .map_err(ser)?
            .map(chapter_id_from_i64)
            .transpose()?,
        player,
        state,
        i64_to_u32("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        i64_to_u32("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        i64_to_u32("final_score", row.try_get("final_score").map_err(ser)?)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok((
        battle_record_id_from_i64(row.try_get("id").map_err(ser)?)?,
        record,
    ))
}

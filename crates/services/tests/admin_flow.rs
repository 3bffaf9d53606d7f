use std::time::Duration;

use arena_core::model::{AccessLevel, ChapterDraft, ChapterId, Difficulty, QuestionDraft};
use arena_core::time::fixed_clock;
use services::{
    AppServices, BattleServiceError, ChapterAccessError, ChapterServiceError,
    CheatSheetServiceError,
};
use storage::repository::StorageError;

async fn sqlite_app(name: &str) -> AppServices {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    AppServices::new_sqlite(&url, fixed_clock(), Duration::ZERO)
        .await
        .expect("sqlite services")
}

#[tokio::test]
async fn admin_builds_a_chapter_that_students_can_play() {
    let app = sqlite_app("memdb_admin_builds").await;

    let mut draft = ChapterDraft::named("Cell Biology");
    draft.difficulty = Difficulty::Hard;
    draft.access_level = AccessLevel::Draft;
    let chapter = app.chapters().create_chapter(draft).await.unwrap();
    assert!(chapter.code().as_str().starts_with("CEL-"));

    let code = chapter.code().to_string();
    let err = app.battles().start(&code).await.unwrap_err();
    assert!(matches!(
        err,
        BattleServiceError::Access(ChapterAccessError::Draft(_))
    ));

    let options: Vec<String> = ["Nucleus", "Mitochondria", "Ribosome"]
        .iter()
        .map(|o| (*o).to_owned())
        .collect();
    app.questions()
        .create_question(QuestionDraft::new(
            chapter.id(),
            "What is the powerhouse of the cell?",
            options,
            1,
        ))
        .await
        .unwrap();

    let sheet = app
        .cheat_sheets()
        .create_cheat_sheet(
            chapter.id(),
            Some("Organelles".into()),
            "https://cdn.arena.id/sheets/organelles.png",
        )
        .await
        .unwrap();

    let mut publish = ChapterDraft::named("Cell Biology");
    publish.difficulty = Difficulty::Hard;
    publish.access_level = AccessLevel::Public;
    let published = app
        .chapters()
        .update_chapter(chapter.id(), publish)
        .await
        .unwrap();
    assert_eq!(published.code(), chapter.code());

    let briefing = app.battles().briefing(&code.to_lowercase()).await.unwrap();
    assert_eq!(briefing.cheat_sheet.as_ref().map(|s| s.id()), Some(sheet.id()));
    assert!(!briefing.should_skip());

    let mut run = app.battles().start(&code).await.unwrap();
    let answer = app.battles().answer(&mut run, 1, None).await.unwrap();
    assert!(answer.is_complete());
    assert_eq!(answer.outcome.unwrap().final_score, 50);

    let listed = app.chapters().list_public_chapters().await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn deleting_a_chapter_removes_its_content() {
    let app = sqlite_app("memdb_admin_delete").await;

    let mut draft = ChapterDraft::named("Astronomy");
    draft.code = Some("AST-0001".into());
    let chapter = app.chapters().create_chapter(draft).await.unwrap();

    let mut clash = ChapterDraft::named("Astrology");
    clash.code = Some("ast-0001".into());
    let err = app.chapters().create_chapter(clash).await.unwrap_err();
    assert!(matches!(err, ChapterServiceError::CodeTaken(_)));

    let options: Vec<String> = ["Venus", "Mars"].iter().map(|o| (*o).to_owned()).collect();
    app.questions()
        .create_question(QuestionDraft::new(
            chapter.id(),
            "Which planet is known as the Red Planet?",
            options,
            1,
        ))
        .await
        .unwrap();
    app.cheat_sheets()
        .create_cheat_sheet(chapter.id(), None, "https://cdn.arena.id/sheets/planets.png")
        .await
        .unwrap();
    let mut run = app.battles().start("AST-0001").await.unwrap();
    app.battles().answer(&mut run, 1, None).await.unwrap();

    app.chapters().delete_chapter(chapter.id()).await.unwrap();

    let results = app.battles().recent_results(None, 5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.chapter_id(), None);
    assert_eq!(results[0].record.final_score(), 50);
    assert!(app.chapters().get_chapter(chapter.id()).await.unwrap().is_none());
    assert!(app.questions().list_all().await.unwrap().is_empty());
    assert!(app.cheat_sheets().list_cheat_sheets().await.unwrap().is_empty());

    let err = app.battles().start("AST-0001").await.unwrap_err();
    assert!(matches!(
        err,
        BattleServiceError::Access(ChapterAccessError::Unknown(_))
    ));

    let err = app
        .cheat_sheets()
        .create_cheat_sheet(chapter.id(), None, "not a url")
        .await
        .unwrap_err();
    assert!(matches!(err, CheatSheetServiceError::CheatSheet(_)));

    let err = app
        .cheat_sheets()
        .create_cheat_sheet(chapter.id(), None, "https://cdn.arena.id/x.png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheatSheetServiceError::Storage(StorageError::NotFound)
    ));
}

async fn delete_after_one_battle(app: &AppServices) -> Vec<Option<ChapterId>> {
    let mut draft = ChapterDraft::named("Chemistry");
    draft.code = Some("CHE-0001".into());
    let chapter = app.chapters().create_chapter(draft).await.unwrap();
    let options: Vec<String> = ["Au", "Ag"].iter().map(|o| (*o).to_owned()).collect();
    app.questions()
        .create_question(QuestionDraft::new(
            chapter.id(),
            "What is the chemical symbol for Gold?",
            options,
            0,
        ))
        .await
        .unwrap();
    let mut run = app.battles().start("CHE-0001").await.unwrap();
    app.battles().answer(&mut run, 0, None).await.unwrap();

    app.chapters().delete_chapter(chapter.id()).await.unwrap();

    app.battles()
        .recent_results(None, 5)
        .await
        .unwrap()
        .iter()
        .map(|row| row.record.chapter_id())
        .collect()
}

#[tokio::test]
async fn both_backends_keep_results_of_deleted_chapters() {
    let memory = delete_after_one_battle(&AppServices::in_memory(fixed_clock())).await;
    let sqlite = delete_after_one_battle(&sqlite_app("memdb_admin_backends").await).await;
    assert_eq!(memory, vec![None]);
    assert_eq!(memory, sqlite);
}

#[tokio::test]
async fn schools_can_be_renamed_and_removed() {
    let app = sqlite_app("memdb_admin_schools").await;

    let school = app
        .schools()
        .create_school("SMA Taruna Nusantara", Some("Jawa Tengah".into()))
        .await
        .unwrap();
    let renamed = app
        .schools()
        .update_school(school.id(), "SMA Taruna Nusantara Magelang", None)
        .await
        .unwrap();
    assert_eq!(renamed.name(), "SMA Taruna Nusantara Magelang");
    assert_eq!(app.schools().list_schools().await.unwrap().len(), 1);

    app.schools().delete_school(school.id()).await.unwrap();
    assert!(app.schools().get_school(school.id()).await.unwrap().is_none());
}

use std::sync::Arc;

use arena_core::model::{ChapterId, CheatSheet, CheatSheetId};
use storage::repository::{CheatSheetRepository, NewCheatSheetRecord, StorageError};

use crate::error::CheatSheetServiceError;

/// Study aids shown on the briefing screen before a battle.
#[derive(Clone)]
pub struct CheatSheetService {
    cheat_sheets: Arc<dyn CheatSheetRepository>,
}

impl CheatSheetService {
    #[must_use]
    pub fn new(cheat_sheets: Arc<dyn CheatSheetRepository>) -> Self {
        Self { cheat_sheets }
    }

    /// # Errors
    ///
    /// Returns `CheatSheetServiceError::CheatSheet` if the image reference is not a
    /// URL and `CheatSheetServiceError::Storage` if the chapter is missing.
    pub async fn create_cheat_sheet(
        &self,
        chapter_id: ChapterId,
        title: Option<String>,
        image: &str,
    ) -> Result<CheatSheet, CheatSheetServiceError> {
        let draft = CheatSheet::new(CheatSheetId::new(0), chapter_id, title, image)?;
        let sheet = self
            .cheat_sheets
            .insert_new_cheat_sheet(NewCheatSheetRecord::from_cheat_sheet(&draft))
            .await?;
        tracing::info!(sheet = %sheet.id(), chapter = %chapter_id, "cheat sheet created");
        Ok(sheet)
    }

    /// # Errors
    ///
    /// Returns `CheatSheetServiceError::Storage` with `StorageError::NotFound` if the
    /// cheat sheet does not exist.
    pub async fn update_cheat_sheet(
        &self,
        id: CheatSheetId,
        chapter_id: ChapterId,
        title: Option<String>,
        image: &str,
    ) -> Result<CheatSheet, CheatSheetServiceError> {
        let exists = self
            .cheat_sheets
            .list_cheat_sheets()
            .await?
            .iter()
            .any(|s| s.id() == id);
        if !exists {
            return Err(StorageError::NotFound.into());
        }
        let sheet = CheatSheet::new(id, chapter_id, title, image)?;
        self.cheat_sheets.upsert_cheat_sheet(&sheet).await?;
        Ok(sheet)
    }

    /// # Errors
    ///
    /// Returns `CheatSheetServiceError::Storage` if the cheat sheet does not exist.
    pub async fn delete_cheat_sheet(&self, id: CheatSheetId) -> Result<(), CheatSheetServiceError> {
        self.cheat_sheets.delete_cheat_sheet(id).await?;
        tracing::info!(sheet = %id, "cheat sheet deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CheatSheetServiceError::Storage` if repository access fails.
    pub async fn list_cheat_sheets(&self) -> Result<Vec<CheatSheet>, CheatSheetServiceError> {
        Ok(self.cheat_sheets.list_cheat_sheets().await?)
    }

    /// The sheet shown when briefing the given chapter.
    ///
    /// # Errors
    ///
    /// Returns `CheatSheetServiceError::Storage` if repository access fails.
    pub async fn for_chapter(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Option<CheatSheet>, CheatSheetServiceError> {
        Ok(self.cheat_sheets.cheat_sheet_for_chapter(chapter_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arena_core::model::{AccessCode, ChapterDraft, CheatSheetError};
    use arena_core::time::fixed_now;
    use storage::repository::Storage;

    async fn chapter(storage: &Storage, code: &str) -> ChapterId {
        storage
            .chapters
            .insert_new_chapter(
                ChapterDraft::named("Cells")
                    .validate(AccessCode::parse(code).unwrap(), fixed_now())
                    .unwrap(),
            )
            .await
            .unwrap()
            .id()
    }

    #[tokio::test]
    async fn first_sheet_is_shown_for_chapter() {
        let storage = Storage::in_memory();
        let service = CheatSheetService::new(Arc::clone(&storage.cheat_sheets));
        let chapter_id = chapter(&storage, "CEL-0001").await;

        let first = service
            .create_cheat_sheet(chapter_id, Some("Organelles".into()), "https://cdn.example.com/a.png")
            .await
            .unwrap();
        service
            .create_cheat_sheet(chapter_id, None, "data:image/png;base64,iVBORw0KGgo=")
            .await
            .unwrap();

        assert_eq!(service.for_chapter(chapter_id).await.unwrap(), Some(first));
        assert_eq!(service.list_cheat_sheets().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_replaces_image() {
        let storage = Storage::in_memory();
        let service = CheatSheetService::new(Arc::clone(&storage.cheat_sheets));
        let chapter_id = chapter(&storage, "CEL-0002").await;
        let sheet = service
            .create_cheat_sheet(chapter_id, None, "https://cdn.example.com/a.png")
            .await
            .unwrap();

        let updated = service
            .update_cheat_sheet(sheet.id(), chapter_id, None, "https://cdn.example.com/b.png")
            .await
            .unwrap();
        assert_eq!(updated.image().as_str(), "https://cdn.example.com/b.png");

        service.delete_cheat_sheet(sheet.id()).await.unwrap();
        assert!(service.for_chapter(chapter_id).await.unwrap().is_none());
        assert!(matches!(
            service
                .update_cheat_sheet(sheet.id(), chapter_id, None, "https://cdn.example.com/c.png")
                .await
                .unwrap_err(),
            CheatSheetServiceError::Storage(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn rejects_non_url_images() {
        let storage = Storage::in_memory();
        let service = CheatSheetService::new(Arc::clone(&storage.cheat_sheets));
        let chapter_id = chapter(&storage, "CEL-0003").await;

        let err = service
            .create_cheat_sheet(chapter_id, None, "not a url")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheatSheetServiceError::CheatSheet(CheatSheetError::InvalidImage(_))
        ));
    }
}

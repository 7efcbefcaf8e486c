//! API request handlers
//!
//! Plain async functions over the catalog handle, kept free of axum types so
//! they can be exercised directly in tests.

use serde_json::Value;

use crate::catalog::{Catalog, CatalogResult, Chapter, DurationTotals, Subject};

use super::models::{LectureResponse, WatchedResponse};

/// Handle health check requests
pub async fn health_check() -> Value {
    serde_json::json!({
        "status": "healthy",
        "service": "lecture-catalog",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
}

/// List all subjects
pub async fn list_subjects(catalog: &Catalog) -> CatalogResult<Vec<Subject>> {
    catalog.subjects().await
}

/// List chapters of one subject
pub async fn list_chapters(catalog: &Catalog, subject_id: i64) -> CatalogResult<Vec<Chapter>> {
    catalog.chapters_of(subject_id).await
}

/// List lectures of one chapter with servable file paths
pub async fn list_lectures(
    catalog: &Catalog,
    chapter_id: i64,
) -> CatalogResult<Vec<LectureResponse>> {
    let lectures = catalog.lectures_of(chapter_id).await?;
    Ok(lectures.into_iter().map(LectureResponse::from).collect())
}

/// Flip a lecture's watched flag
pub async fn toggle_watched(catalog: &Catalog, lecture_id: i64) -> CatalogResult<WatchedResponse> {
    let watched = catalog.toggle_watched(lecture_id).await?;
    Ok(WatchedResponse {
        id: lecture_id,
        watched,
    })
}

/// Watched/total duration for one chapter
pub async fn chapter_duration(catalog: &Catalog, chapter_id: i64) -> CatalogResult<DurationTotals> {
    catalog.chapter_duration(chapter_id).await
}

/// Watched/total duration for one subject
pub async fn subject_duration(catalog: &Catalog, subject_id: i64) -> CatalogResult<DurationTotals> {
    catalog.subject_duration(subject_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;

    async fn seeded_catalog() -> (Catalog, i64, i64, i64) {
        let catalog = Catalog::connect("sqlite::memory:", 1).await.unwrap();
        let subject = catalog.ensure_subject("Math").await.unwrap();
        let chapter = catalog.ensure_chapter(subject.id, "Algebra").await.unwrap();
        let lecture = catalog
            .ensure_lecture(chapter.id, "Lecture #1.mp4", "/lib/Math/Algebra/Lecture #1.mp4", 100)
            .await
            .unwrap();
        (catalog, subject.id, chapter.id, lecture.id)
    }

    #[tokio::test]
    async fn test_list_subjects() {
        let (catalog, _, _, _) = seeded_catalog().await;
        let subjects = list_subjects(&catalog).await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].name, "Math");
    }

    #[tokio::test]
    async fn test_lecture_path_escapes_hash() {
        let (catalog, _, chapter_id, _) = seeded_catalog().await;
        let lectures = list_lectures(&catalog, chapter_id).await.unwrap();
        assert_eq!(lectures.len(), 1);
        assert_eq!(
            lectures[0].file_path,
            "/lectures/Math/Algebra/Lecture%20%231.mp4"
        );
    }

    #[tokio::test]
    async fn test_toggle_then_chapter_duration() {
        let (catalog, _, chapter_id, lecture_id) = seeded_catalog().await;

        let toggled = toggle_watched(&catalog, lecture_id).await.unwrap();
        assert!(toggled.watched);
        assert_eq!(toggled.id, lecture_id);

        let totals = chapter_duration(&catalog, chapter_id).await.unwrap();
        assert_eq!(totals.watched_duration, 100);
        assert_eq!(totals.total_duration, 100);
    }

    #[tokio::test]
    async fn test_toggle_unknown_lecture() {
        let (catalog, _, _, _) = seeded_catalog().await;
        match toggle_watched(&catalog, 999).await {
            Err(CatalogError::LectureNotFound(999)) => {}
            other => panic!("expected LectureNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subject_duration_of_unwatched_lectures_is_zero() {
        let (catalog, subject_id, _, _) = seeded_catalog().await;
        let totals = subject_duration(&catalog, subject_id).await.unwrap();
        assert_eq!(totals.watched_duration, 0);
        assert_eq!(totals.total_duration, 100);
    }

    #[tokio::test]
    async fn test_health_check_payload() {
        let payload = health_check().await;
        assert_eq!(payload["status"], "healthy");
        assert_eq!(payload["service"], "lecture-catalog");
    }
}

//! Library scan: walks the subject/chapter/lecture tree and reconciles it
//! into the catalog.
//!
//! Reconciliation is insert-if-absent only. Rows are never updated or
//! deleted, so rescanning an unchanged tree is a no-op and a moved file
//! produces a new row instead of touching the old one.

use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::probe::DurationProbe;

/// Counters reported after a scan completes
#[derive(Debug, Default, Clone)]
pub struct ScanSummary {
    /// Subject directories processed
    pub subjects: usize,

    /// Chapter directories processed
    pub chapters: usize,

    /// Lecture files matched by extension
    pub lectures: usize,

    /// Lecture rows newly inserted this scan
    pub new_lectures: usize,

    /// Subtrees or entities abandoned because of an error
    pub failures: usize,
}

/// Walks the lecture library and feeds the catalog
pub struct LibraryScanner {
    catalog: Catalog,
    probe: Arc<dyn DurationProbe>,
    video_extensions: Vec<String>,
}

impl LibraryScanner {
    pub fn new(
        catalog: Catalog,
        probe: Arc<dyn DurationProbe>,
        video_extensions: Vec<String>,
    ) -> Self {
        Self {
            catalog,
            probe,
            video_extensions,
        }
    }

    /// Scan the whole library once.
    ///
    /// Every failure degrades to skip-and-continue: a directory read error
    /// abandons that subtree, a storage error abandons that single entity,
    /// and sibling subtrees always keep going.
    pub async fn scan(&self, root: &Path) -> ScanSummary {
        let mut summary = ScanSummary::default();

        info!("🔍 Scanning lecture library: {}", root.display());

        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to read library root {}: {}", root.display(), e);
                summary.failures += 1;
                return summary;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read library root entry: {}", e);
                    summary.failures += 1;
                    break;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let subject_name = entry.file_name().to_string_lossy().into_owned();
            let subject = match self.catalog.ensure_subject(&subject_name).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Failed to record subject {}: {}", subject_name, e);
                    summary.failures += 1;
                    continue;
                }
            };

            summary.subjects += 1;
            self.scan_subject(&path, subject.id, &mut summary).await;
        }

        info!(
            "✅ Scan complete: {} subjects, {} chapters, {} lectures ({} new, {} failures)",
            summary.subjects, summary.chapters, summary.lectures, summary.new_lectures, summary.failures
        );

        summary
    }

    /// Process one subject directory: its subdirectories become chapters
    async fn scan_subject(&self, subject_dir: &Path, subject_id: i64, summary: &mut ScanSummary) {
        let mut entries = match fs::read_dir(subject_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to read subject {}: {}", subject_dir.display(), e);
                summary.failures += 1;
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read entry in {}: {}", subject_dir.display(), e);
                    summary.failures += 1;
                    break;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let chapter_name = entry.file_name().to_string_lossy().into_owned();
            let chapter = match self.catalog.ensure_chapter(subject_id, &chapter_name).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Failed to record chapter {}: {}", chapter_name, e);
                    summary.failures += 1;
                    continue;
                }
            };

            summary.chapters += 1;
            self.scan_chapter(&path, chapter.id, summary).await;
        }
    }

    /// Process one chapter directory: matching files become lectures
    async fn scan_chapter(&self, chapter_dir: &Path, chapter_id: i64, summary: &mut ScanSummary) {
        let mut entries = match fs::read_dir(chapter_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to read chapter {}: {}", chapter_dir.display(), e);
                summary.failures += 1;
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read entry in {}: {}", chapter_dir.display(), e);
                    summary.failures += 1;
                    break;
                }
            };

            let path = entry.path();
            if !path.is_file() || !self.is_video(&path) {
                continue;
            }

            summary.lectures += 1;

            let lecture_name = entry.file_name().to_string_lossy().into_owned();
            let duration = self.probe.duration_secs(&path).await;

            match self
                .catalog
                .ensure_lecture(chapter_id, &lecture_name, &path.to_string_lossy(), duration)
                .await
            {
                Ok(outcome) if outcome.created => summary.new_lectures += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to record lecture {}: {}", lecture_name, e);
                    summary.failures += 1;
                }
            }
        }
    }

    fn is_video(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.video_extensions.contains(&ext)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FixedProbe(u64);

    #[async_trait]
    impl DurationProbe for FixedProbe {
        async fn duration_secs(&self, _path: &Path) -> u64 {
            self.0
        }
    }

    async fn test_catalog() -> Catalog {
        Catalog::connect("sqlite::memory:", 1).await.unwrap()
    }

    fn scanner(catalog: Catalog, duration: u64) -> LibraryScanner {
        LibraryScanner::new(catalog, Arc::new(FixedProbe(duration)), vec!["mp4".to_string()])
    }

    async fn make_tree(root: &Path, files: &[(&str, &str, &str)]) {
        for (subject, chapter, file) in files {
            let dir = root.join(subject).join(chapter);
            fs::create_dir_all(&dir).await.unwrap();
            fs::write(dir.join(file), b"video bytes").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_single_lecture_tree() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &[("Math", "Algebra", "intro.mp4")]).await;

        let catalog = test_catalog().await;
        let summary = scanner(catalog.clone(), 120).scan(temp.path()).await;

        assert_eq!(summary.subjects, 1);
        assert_eq!(summary.chapters, 1);
        assert_eq!(summary.lectures, 1);
        assert_eq!(summary.new_lectures, 1);
        assert_eq!(summary.failures, 0);

        let subjects = catalog.subjects().await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].name, "Math");

        let chapters = catalog.chapters_of(subjects[0].id).await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].name, "Algebra");

        let lectures = catalog.lectures_of(chapters[0].id).await.unwrap();
        assert_eq!(lectures.len(), 1);
        assert_eq!(lectures[0].name, "intro.mp4");
        assert_eq!(lectures[0].duration, 120);
        assert!(!lectures[0].watched);
    }

    #[tokio::test]
    async fn test_non_video_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &[("Math", "Algebra", "intro.mp4")]).await;
        let chapter_dir = temp.path().join("Math").join("Algebra");
        fs::write(chapter_dir.join("notes.txt"), b"text").await.unwrap();

        let catalog = test_catalog().await;
        let summary = scanner(catalog.clone(), 10).scan(temp.path()).await;

        assert_eq!(summary.lectures, 1);
        let subjects = catalog.subjects().await.unwrap();
        let chapters = catalog.chapters_of(subjects[0].id).await.unwrap();
        let lectures = catalog.lectures_of(chapters[0].id).await.unwrap();
        assert_eq!(lectures.len(), 1);
        assert_eq!(lectures[0].name, "intro.mp4");
    }

    #[tokio::test]
    async fn test_stray_files_at_subject_and_chapter_level() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &[("Math", "Algebra", "intro.mp4")]).await;
        // A file at library root must not become a subject, nor a file inside
        // a subject a chapter.
        fs::write(temp.path().join("README.md"), b"x").await.unwrap();
        fs::write(temp.path().join("Math").join("syllabus.pdf"), b"x")
            .await
            .unwrap();

        let catalog = test_catalog().await;
        let summary = scanner(catalog.clone(), 10).scan(temp.path()).await;

        assert_eq!(summary.subjects, 1);
        assert_eq!(summary.chapters, 1);

        let subjects = catalog.subjects().await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(catalog.chapters_of(subjects[0].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rescan_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        make_tree(
            temp.path(),
            &[
                ("Math", "Algebra", "intro.mp4"),
                ("Math", "Algebra", "linear equations.mp4"),
                ("Physics", "Mechanics", "kinematics.mp4"),
            ],
        )
        .await;

        let catalog = test_catalog().await;
        let scanner = scanner(catalog.clone(), 30);

        let first = scanner.scan(temp.path()).await;
        assert_eq!(first.new_lectures, 3);

        let second = scanner.scan(temp.path()).await;
        assert_eq!(second.lectures, 3);
        assert_eq!(second.new_lectures, 0);
        assert_eq!(second.failures, 0);

        assert_eq!(catalog.subjects().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rescan_preserves_watched_flag() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &[("Math", "Algebra", "intro.mp4")]).await;

        let catalog = test_catalog().await;
        let scanner = scanner(catalog.clone(), 30);
        scanner.scan(temp.path()).await;

        let subjects = catalog.subjects().await.unwrap();
        let chapters = catalog.chapters_of(subjects[0].id).await.unwrap();
        let lecture = &catalog.lectures_of(chapters[0].id).await.unwrap()[0];
        catalog.toggle_watched(lecture.id).await.unwrap();

        scanner.scan(temp.path()).await;

        let lectures = catalog.lectures_of(chapters[0].id).await.unwrap();
        assert_eq!(lectures.len(), 1);
        assert!(lectures[0].watched);
    }

    #[tokio::test]
    async fn test_unprobeable_lecture_inserted_with_zero_duration() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &[("Math", "Algebra", "broken.mp4")]).await;

        let catalog = test_catalog().await;
        scanner(catalog.clone(), 0).scan(temp.path()).await;

        let subjects = catalog.subjects().await.unwrap();
        let chapters = catalog.chapters_of(subjects[0].id).await.unwrap();
        let lectures = catalog.lectures_of(chapters[0].id).await.unwrap();
        assert_eq!(lectures.len(), 1);
        assert_eq!(lectures[0].duration, 0);
    }

    #[tokio::test]
    async fn test_missing_root_aborts_without_rows() {
        let catalog = test_catalog().await;
        let summary = scanner(catalog.clone(), 10)
            .scan(&PathBuf::from("/definitely/not/a/real/library"))
            .await;

        assert_eq!(summary.failures, 1);
        assert!(catalog.subjects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uppercase_extension_matches() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &[("Math", "Algebra", "INTRO.MP4")]).await;

        let catalog = test_catalog().await;
        let summary = scanner(catalog.clone(), 10).scan(temp.path()).await;
        assert_eq!(summary.lectures, 1);
    }
}

//! API data models

use serde::{Deserialize, Serialize};

use crate::catalog::LectureEntry;

/// Lecture as served to the player, with a URL-escaped path under /lectures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureResponse {
    pub id: i64,
    pub chapter_id: i64,
    pub name: String,
    pub file_path: String,
    pub watched: bool,
    pub duration: i64,
}

/// Result of a watched-flag toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedResponse {
    pub id: i64,
    pub watched: bool,
}

impl From<LectureEntry> for LectureResponse {
    fn from(entry: LectureEntry) -> Self {
        let file_path = serving_path(&entry.subject_name, &entry.chapter_name, &entry.name);
        Self {
            id: entry.id,
            chapter_id: entry.chapter_id,
            name: entry.name,
            file_path,
            watched: entry.watched,
            duration: entry.duration,
        }
    }
}

/// Build the static-serving URL path for a lecture.
///
/// Each segment is percent-encoded so names containing characters like `#`
/// survive the round trip through the player's URL handling.
pub fn serving_path(subject: &str, chapter: &str, lecture: &str) -> String {
    format!(
        "/lectures/{}/{}/{}",
        urlencoding::encode(subject),
        urlencoding::encode(chapter),
        urlencoding::encode(lecture)
    )
}

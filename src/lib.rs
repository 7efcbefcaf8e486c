/// Lecture Catalog - local video lecture library server
///
/// Scans a subject/chapter/lecture directory tree into a relational catalog,
/// tracks per-lecture watched state, and serves the catalog plus the raw
/// video files for sequential playback.

pub mod api;
pub mod catalog;
pub mod config;
pub mod probe;
pub mod scanner;

// Re-export main types for easy access
pub use crate::catalog::{Catalog, CatalogError, Chapter, DurationTotals, LectureEntry, Subject};
pub use crate::config::Config;
pub use crate::probe::{DurationProbe, FfprobeDurationProbe};
pub use crate::scanner::{LibraryScanner, ScanSummary};

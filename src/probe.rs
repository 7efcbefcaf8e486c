use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

/// Extracts playback duration from media files.
///
/// Failures never propagate: a missing probe binary, a corrupt file, or
/// non-media content all yield a duration of zero so the lecture is still
/// cataloged.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Playback length of the file in whole seconds, 0 if it cannot be determined
    async fn duration_secs(&self, path: &Path) -> u64;
}

/// Duration probe backed by the ffprobe command line tool
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    binary: String,
}

impl FfprobeDurationProbe {
    pub fn new() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }

    /// Use a specific probe binary instead of `ffprobe` from PATH
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_secs(&self, path: &Path) -> u64 {
        let output = tokio::process::Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {} for {}: {}", self.binary, path.display(), e);
                return 0;
            }
        };

        if !output.status.success() {
            warn!(
                "{} exited with {} for {}",
                self.binary,
                output.status,
                path.display()
            );
            return 0;
        }

        match parse_duration_output(&String::from_utf8_lossy(&output.stdout)) {
            Some(secs) => secs,
            None => {
                warn!("Unparsable duration output for {}", path.display());
                0
            }
        }
    }
}

/// Parse ffprobe's duration line (fractional seconds) into whole seconds
fn parse_duration_output(raw: &str) -> Option<u64> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(secs.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(parse_duration_output("120.433333\n"), Some(120));
        assert_eq!(parse_duration_output("119.7"), Some(120));
        assert_eq!(parse_duration_output("0.0"), Some(0));
        assert_eq!(parse_duration_output("N/A"), None);
        assert_eq!(parse_duration_output(""), None);
        assert_eq!(parse_duration_output("-3.0"), None);
    }

    #[tokio::test]
    async fn test_missing_probe_binary_yields_zero() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let probe = FfprobeDurationProbe::with_binary("ffprobe-that-does-not-exist");
        assert_eq!(probe.duration_secs(temp.path()).await, 0);
    }

    #[tokio::test]
    async fn test_non_media_file_yields_zero() {
        // Only meaningful where ffprobe is installed; otherwise the missing
        // binary path also yields zero.
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"not a video").unwrap();
        let probe = FfprobeDurationProbe::new();
        assert_eq!(probe.duration_secs(temp.path()).await, 0);
    }
}

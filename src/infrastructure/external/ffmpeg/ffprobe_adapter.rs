//! FFprobe Adapter Implementation
//!
//! Metadata prober backed by an ffprobe-compatible binary.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::domain::value_objects::{EpisodicHint, ProbeReport, Resolution};
use crate::interfaces::external_services::MetadataProber;
use crate::shared::error::ProbeError;

/// FFprobe adapter for structural metadata extraction
pub struct FfprobeAdapter {
    binary: String,
    timeout: Duration,
}

impl FfprobeAdapter {
    /// Creates a new adapter.
    ///
    /// # Arguments
    /// * `binary` - Prober executable path (`ffprobe` by default)
    /// * `timeout` - Timeout for a single probe
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn execute(&self, args: &[&str]) -> Result<String, ProbeError> {
        let result = timeout(self.timeout, async {
            let output = Command::new(&self.binary).args(args).output().await;

            match output {
                Ok(output) => {
                    if output.status.success() {
                        Ok(String::from_utf8_lossy(&output.stdout).to_string())
                    } else {
                        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                        Err(ProbeError::ExecutionFailed(stderr))
                    }
                }
                Err(e) => Err(ProbeError::Io(e)),
            }
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(ProbeError::Timeout("probe timed out".into())),
        }
    }

    fn parse_report(json: &str) -> Result<ProbeReport, ProbeError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ProbeError::ParseError(e.to_string()))?;

        let streams = value
            .get("streams")
            .and_then(|s| s.as_array())
            .ok_or_else(|| ProbeError::InvalidOutput("no streams array".into()))?;

        let video = streams
            .iter()
            .find(|s| {
                s.get("codec_type")
                    .and_then(|ct| ct.as_str())
                    .map(|t| t == "video")
                    .unwrap_or(false)
            })
            .ok_or_else(|| ProbeError::NotAVideo("no video stream".into()))?;

        let width = video.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
        let height = video.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;
        if width == 0 || height == 0 {
            return Err(ProbeError::InvalidOutput("video stream has no frame size".into()));
        }

        let format = value.get("format");
        let duration_secs = format
            .and_then(|f| f.get("duration"))
            .and_then(|d| d.as_str())
            .and_then(|s| s.parse::<f64>().ok());
        let container = format
            .and_then(|f| f.get("format_name"))
            .and_then(|n| n.as_str())
            .map(|s| s.to_string());

        let tags = format.and_then(|f| f.get("tags"));
        let title = tags
            .and_then(|t| t.get("title"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string());

        let season = Self::tag_number(tags, "season_number");
        let episode =
            Self::tag_number(tags, "episode_sort").or_else(|| Self::tag_number(tags, "episode_id"));
        let episodic = if season.is_some() || episode.is_some() {
            Some(EpisodicHint { season, episode })
        } else {
            None
        };

        Ok(ProbeReport {
            title,
            duration_secs,
            resolution: Resolution::new(width, height),
            container,
            episodic,
        })
    }

    fn tag_number(tags: Option<&serde_json::Value>, key: &str) -> Option<u32> {
        tags.and_then(|t| t.get(key))
            .and_then(|v| v.as_str())
            .and_then(|s| s.trim().parse().ok())
    }
}

#[async_trait]
impl MetadataProber for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ProbeError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ProbeError::InvalidOutput("non-utf8 path".into()))?;

        let stdout = self
            .execute(&[
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                path_str,
            ])
            .await?;

        Self::parse_report(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_movie_probe_output() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1280, "height": 760},
                {"codec_type": "audio", "channels": 2}
            ],
            "format": {
                "duration": "5924.16",
                "format_name": "matroska,webm",
                "tags": {"title": "Shaun of the Dead"}
            }
        }"#;

        let report = FfprobeAdapter::parse_report(json).unwrap();
        assert_eq!(report.resolution, Resolution::new(1280, 760));
        assert_eq!(report.title.as_deref(), Some("Shaun of the Dead"));
        assert_eq!(report.duration_secs, Some(5924.16));
        assert!(report.episodic.is_none());
    }

    #[test]
    fn parses_episodic_tags() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 1920, "height": 1080}],
            "format": {"tags": {"season_number": "2", "episode_sort": "5"}}
        }"#;

        let report = FfprobeAdapter::parse_report(json).unwrap();
        let hint = report.episodic.unwrap();
        assert_eq!(hint.season, Some(2));
        assert_eq!(hint.episode, Some(5));
    }

    #[test]
    fn audio_only_file_is_not_a_video() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "channels": 2}],
            "format": {"duration": "10.0"}
        }"#;

        assert!(matches!(
            FfprobeAdapter::parse_report(json),
            Err(ProbeError::NotAVideo(_))
        ));
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        assert!(matches!(
            FfprobeAdapter::parse_report("not json"),
            Err(ProbeError::ParseError(_))
        ));
    }
}

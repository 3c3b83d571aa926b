//! FFmpeg Runner Implementation
//!
//! Transcoder runner backed by an ffmpeg-compatible binary. Structured
//! progress is read from `-progress pipe:1`; the error stream is mined
//! for the diagnostic on failure.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::value_objects::ProgressSample;
use crate::interfaces::external_services::{RunnerJob, TranscodeRunner};
use crate::shared::error::RunnerError;

/// FFmpeg adapter for transcode execution
pub struct FfmpegRunner {
    binary: String,
}

impl FfmpegRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TranscodeRunner for FfmpegRunner {
    async fn run(
        &self,
        job: RunnerJob,
        progress: mpsc::Sender<ProgressSample>,
        cancel: CancellationToken,
    ) -> Result<(), RunnerError> {
        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-y").arg("-i").arg(&job.input);
        for opt in &job.options {
            cmd.arg(format!("-{}", opt.name));
            if let Some(value) = &opt.value {
                cmd.arg(value);
            }
        }
        cmd.arg("-progress")
            .arg("pipe:1")
            .arg("-nostats")
            .arg(&job.output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Launching transcoder for {:?}", job.output);
        let mut child = cmd
            .spawn()
            .map_err(|e| RunnerError::Startup(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Startup("no stdout pipe".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::Startup("no stderr pipe".to_string()))?;

        // Drain both pipes concurrently with waiting so the process never
        // blocks on a full pipe.
        let duration_hint = job.duration_hint_secs;
        let progress_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut block = ProgressBlock::default();
            while let Ok(Some(line)) = lines.next_line().await {
                if block.feed(&line) {
                    if let Some(sample) = block.take_sample(duration_hint) {
                        // Receiver lag must not stall the transcode
                        let _ = progress.try_send(sample);
                    }
                }
            }
        });

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        let status = match waited {
            Some(status) => status?,
            None => {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to signal transcoder: {}", e);
                }
                let _ = child.wait().await;
                progress_task.abort();
                stderr_task.abort();
                return Err(RunnerError::Cancelled);
            }
        };

        let _ = progress_task.await;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::Failed(mine_diagnostic(&stderr_output)))
        }
    }
}

/// Accumulates one `-progress` key=value block.
#[derive(Debug, Default)]
struct ProgressBlock {
    elapsed_secs: Option<f64>,
    speed: Option<f32>,
    bitrate_kbps: Option<f64>,
}

impl ProgressBlock {
    /// Feeds one line; returns true when the block is complete.
    fn feed(&mut self, line: &str) -> bool {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("out_time_ms=") {
            // Values named out_time_ms are actually microseconds
            if let Ok(us) = rest.parse::<f64>() {
                self.elapsed_secs = Some(us / 1_000_000.0);
            }
        } else if let Some(rest) = line.strip_prefix("out_time=") {
            if self.elapsed_secs.is_none() {
                self.elapsed_secs = Some(parse_clock(rest));
            }
        } else if let Some(rest) = line.strip_prefix("speed=") {
            if let Ok(v) = rest.trim().trim_end_matches('x').parse::<f32>() {
                self.speed = Some(v);
            }
        } else if let Some(rest) = line.strip_prefix("bitrate=") {
            if let Ok(v) = rest.trim().trim_end_matches("kbits/s").parse::<f64>() {
                self.bitrate_kbps = Some(v);
            }
        } else if line.starts_with("progress=") {
            return true;
        }
        false
    }

    fn take_sample(&mut self, duration_hint: Option<f64>) -> Option<ProgressSample> {
        let elapsed = self.elapsed_secs.take()?;
        let percent = duration_hint
            .filter(|d| *d > 0.0)
            .map(|d| ((elapsed / d) * 100.0).clamp(0.0, 100.0) as f32);
        Some(ProgressSample {
            percent,
            speed: self.speed.take(),
            bitrate_kbps: self.bitrate_kbps.take(),
            elapsed_secs: elapsed,
        })
    }
}

/// Parses `HH:MM:SS.micros` clock values.
fn parse_clock(s: &str) -> f64 {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() == 3 {
        let h = parts[0].parse::<f64>().unwrap_or(0.0);
        let m = parts[1].parse::<f64>().unwrap_or(0.0);
        let sec = parts[2].parse::<f64>().unwrap_or(0.0);
        return h * 3600.0 + m * 60.0 + sec;
    }
    s.trim().parse().unwrap_or(0.0)
}

/// Mines the runner's error stream for the failure reason.
///
/// Contract: the first JSON object following the token `message:` carries
/// the reason in its `error.string` field; on any parse failure the raw
/// first message block is used instead.
pub fn mine_diagnostic(stderr: &str) -> String {
    if let Some(idx) = stderr.find("message:") {
        let rest = &stderr[idx + "message:".len()..];
        if let Some(json) = first_json_object(rest) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(json) {
                if let Some(reason) = value.pointer("/error/string").and_then(|v| v.as_str()) {
                    return reason.to_string();
                }
            }
        }
        let block: Vec<&str> = rest
            .lines()
            .map(str::trim)
            .take_while(|l| !l.is_empty())
            .collect();
        let block = block.join(" ").trim().to_string();
        if !block.is_empty() {
            return block;
        }
    }

    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("transcoder terminated abnormally")
        .to_string()
}

/// Extracts the first balanced `{...}` object from the input.
fn first_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_block_parses_microsecond_timestamps() {
        let mut block = ProgressBlock::default();
        assert!(!block.feed("out_time_ms=820000"));
        assert!(!block.feed("speed=3.1x"));
        assert!(!block.feed("bitrate=2514.3kbits/s"));
        assert!(block.feed("progress=continue"));

        let sample = block.take_sample(Some(8.2)).unwrap();
        assert!((sample.elapsed_secs - 0.82).abs() < 1e-9);
        assert_eq!(sample.speed, Some(3.1));
        assert_eq!(sample.bitrate_kbps, Some(2514.3));
        assert!((sample.percent.unwrap() - 10.0).abs() < 0.01);
    }

    #[test]
    fn progress_block_accepts_clock_timestamps() {
        let mut block = ProgressBlock::default();
        block.feed("out_time=00:01:23.500000");
        block.feed("progress=end");
        let sample = block.take_sample(None).unwrap();
        assert!((sample.elapsed_secs - 83.5).abs() < 1e-9);
        assert_eq!(sample.percent, None);
    }

    #[test]
    fn diagnostic_uses_error_string_field() {
        let stderr = "frame= 100\nmessage: {\"error\": {\"string\": \"unsupported pixel format\", \"code\": 22}}\ntrailing";
        assert_eq!(mine_diagnostic(stderr), "unsupported pixel format");
    }

    #[test]
    fn diagnostic_handles_nested_objects() {
        let stderr = r#"message: {"error": {"string": "bad option", "context": {"flag": "-x"}}}"#;
        assert_eq!(mine_diagnostic(stderr), "bad option");
    }

    #[test]
    fn diagnostic_falls_back_to_raw_block_on_parse_failure() {
        let stderr = "message: not json at all\nsecond line\n\nafter blank";
        assert_eq!(mine_diagnostic(stderr), "not json at all second line");
    }

    #[test]
    fn diagnostic_without_message_token_uses_last_line() {
        let stderr = "Input #0, matroska\n  Stream #0:0: Video\nConversion failed!\n";
        assert_eq!(mine_diagnostic(stderr), "Conversion failed!");
    }
}

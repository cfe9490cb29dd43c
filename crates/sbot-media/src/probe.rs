//! FFprobe artifact information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Probed media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// File size in bytes
    pub size: u64,
    /// Whether the file has an audio stream
    pub has_audio: bool,
    /// Whether the file has a video stream
    pub has_video: bool,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    duration: Option<String>,
}

/// Probe a media file for duration and stream layout.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Get audio duration in seconds.
///
/// Errors with `InvalidMedia` when the probed duration is not positive;
/// a silent zero-length narration must never reach the composer.
pub async fn audio_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    let info = probe_media(path).await?;

    if !info.has_audio {
        return Err(MediaError::invalid_media(format!(
            "No audio stream in {}",
            path.display()
        )));
    }
    if info.duration <= 0.0 {
        return Err(MediaError::invalid_media(format!(
            "Non-positive audio duration in {}",
            path.display()
        )));
    }

    Ok(info.duration)
}

/// Parse FFprobe's JSON output.
fn parse_probe_output(bytes: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(bytes)?;

    // Container duration first, longest stream duration as fallback
    let format_duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok());

    let stream_duration = probe
        .streams
        .iter()
        .filter_map(|s| s.duration.as_ref()?.parse::<f64>().ok())
        .fold(None::<f64>, |acc, d| Some(acc.map_or(d, |a| a.max(d))));

    let duration = format_duration.or(stream_duration).unwrap_or(0.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    Ok(MediaInfo {
        duration,
        size,
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
        has_video: probe.streams.iter().any(|s| s.codec_type == "video"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "format": {"duration": "42.300000", "size": "338944"},
            "streams": [{"codec_type": "audio", "duration": "42.300000"}]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 42.3).abs() < 1e-6);
        assert_eq!(info.size, 338944);
        assert!(info.has_audio);
        assert!(!info.has_video);
    }

    #[test]
    fn test_parse_falls_back_to_stream_duration() {
        let json = br#"{
            "format": {"size": "1024"},
            "streams": [
                {"codec_type": "audio", "duration": "12.5"},
                {"codec_type": "video", "duration": "12.4"}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 12.5).abs() < 1e-6);
        assert!(info.has_video);
    }

    #[test]
    fn test_parse_missing_duration_is_zero() {
        let json = br#"{"format": {}, "streams": []}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration, 0.0);
        assert!(!info.has_audio);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_media("/nonexistent/narration.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}

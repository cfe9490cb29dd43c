//! Encoding a composed clip to MP4.
//!
//! The codec is a black box invoked with a fixed parameter set. The
//! encoder's obligations: never leave a partial file at the final path
//! (write to a temp name, rename on success, delete on failure), always
//! release the subprocess, and surface failures with the codec's own
//! stderr text attached.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use sbot_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::timeline::ComposedClip;

/// Default encode timeout in seconds.
const DEFAULT_ENCODE_TIMEOUT_SECS: u64 = 600;

/// Encodes composed clips with a fixed parameter set.
#[derive(Debug, Clone)]
pub struct Encoder {
    encoding: EncodingConfig,
    timeout_secs: u64,
}

impl Encoder {
    /// Create an encoder with the given fixed parameters.
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            timeout_secs: DEFAULT_ENCODE_TIMEOUT_SECS,
        }
    }

    /// Override the encode timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Encode `clip` to `output`.
    ///
    /// On success the file at `output` exists with non-zero size. If the
    /// clip carries a text overlay and the render fails (typically a
    /// missing font), the encode is retried once without the overlay
    /// rather than failing the run.
    pub async fn encode(&self, clip: &ComposedClip, output: impl AsRef<Path>) -> MediaResult<PathBuf> {
        let output = output.as_ref();

        if let Some(parent) = output.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        match self.encode_once(clip, output, true).await {
            Ok(path) => Ok(path),
            Err(e) if clip.has_overlay() => {
                warn!("Encode with text overlay failed ({}), retrying without overlay", e);
                self.encode_once(clip, output, false).await
            }
            Err(e) => Err(e),
        }
    }

    /// One encode attempt, staged through a temp name next to `output`.
    async fn encode_once(
        &self,
        clip: &ComposedClip,
        output: &Path,
        include_overlay: bool,
    ) -> MediaResult<PathBuf> {
        let staging = staging_path(output);

        let mut cmd = FfmpegCommand::new(&staging)
            .looped_image(&clip.image, clip.fps)
            .input(&clip.audio)
            .duration(clip.duration_secs)
            .frame_rate(clip.fps)
            .encoding(&self.encoding)
            .output_args(["-movflags", "+faststart"]);

        if let Some(filter) = clip.video_filter(include_overlay) {
            cmd = cmd.video_filter(filter);
        }
        if let Some(filter) = clip.audio_filter() {
            cmd = cmd.audio_filter(filter.to_string());
        }

        let result = FfmpegRunner::new()
            .with_timeout(self.timeout_secs)
            .run(&cmd)
            .await;

        if let Err(e) = result {
            // Never leave a partial file behind
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e);
        }

        // Postcondition: the artifact exists and is non-empty before it
        // may reach the final path.
        let meta = tokio::fs::metadata(&staging).await.map_err(|_| {
            MediaError::encode_failed("Encoder produced no output file", None, None)
        })?;
        if meta.len() == 0 {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(MediaError::encode_failed(
                "Encoder produced an empty output file",
                None,
                None,
            ));
        }

        tokio::fs::rename(&staging, output).await?;

        info!(
            "Encoded {:.1}s clip to {} ({} bytes)",
            clip.duration_secs,
            output.display(),
            meta.len()
        );

        Ok(output.to_path_buf())
    }
}

/// Temp name in the same directory as the destination, keeping the
/// container extension so FFmpeg muxes MP4.
fn staging_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".part");
    if let Some(ext) = output.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    output.with_file_name(name)
}

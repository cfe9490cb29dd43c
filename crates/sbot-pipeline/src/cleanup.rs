//! Temp artifact cleanup.
//!
//! Runs unconditionally at the end of every run, success or failure,
//! and is idempotent: cleaning an already-clean temp set is a no-op.

use tracing::{debug, warn};

use crate::config::PipelineConfig;

/// Create the temp and credentials directories if absent.
pub async fn setup_directories(config: &PipelineConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.temp_dir).await?;
    tokio::fs::create_dir_all(&config.credentials_dir).await?;
    Ok(())
}

/// Remove the fixed temp artifacts. Missing files are skipped silently;
/// other removal failures are logged and do not propagate.
pub async fn clean_temp_files(config: &PipelineConfig) {
    for path in [
        config.audio_path(),
        config.image_path(),
        config.video_path(),
    ] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Cleaned up: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Error cleaning {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            temp_dir: dir.path().join("temp"),
            credentials_dir: dir.path().join("credentials"),
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_setup_creates_directories() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        setup_directories(&config).await.unwrap();
        assert!(config.temp_dir.is_dir());
        assert!(config.credentials_dir.is_dir());
    }

    #[tokio::test]
    async fn test_clean_removes_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        setup_directories(&config).await.unwrap();

        std::fs::write(config.audio_path(), b"mp3").unwrap();
        std::fs::write(config.image_path(), b"jpg").unwrap();
        std::fs::write(config.video_path(), b"mp4").unwrap();

        clean_temp_files(&config).await;

        assert!(!config.audio_path().exists());
        assert!(!config.image_path().exists());
        assert!(!config.video_path().exists());
    }

    #[tokio::test]
    async fn test_clean_twice_is_noop() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        setup_directories(&config).await.unwrap();

        std::fs::write(config.audio_path(), b"mp3").unwrap();

        clean_temp_files(&config).await;
        // Second pass over an already-clean temp set must not error
        clean_temp_files(&config).await;

        assert!(!config.audio_path().exists());
    }
}

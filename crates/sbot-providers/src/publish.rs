//! Publishing the finished video to YouTube.
//!
//! Uses the Data API v3 resumable upload with OAuth tokens stored as
//! JSON under a fixed credentials directory. Tokens are created by a
//! one-time interactive authorization outside this process, reused
//! across runs, and refreshed here when expired. Absent credentials are
//! a recoverable "skip publish" condition, not a failure.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Client secret file name inside the credentials directory.
pub const CLIENT_SECRET_FILE: &str = "client_secret.json";
/// Stored token file name inside the credentials directory.
pub const TOKEN_FILE: &str = "token.json";

/// Default request timeout for metadata calls (the media PUT gets more).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Upload timeout for the media body.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// YouTube upload endpoint base.
const YOUTUBE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com";

/// Receipt for a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Hosted video identifier
    pub video_id: String,
}

/// Uploads a finished video to a hosting service.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload the video; `CredentialsMissing` signals a skip, any other
    /// error a failed upload.
    async fn upload(
        &self,
        video_path: &Path,
        title: &str,
        description: &str,
    ) -> ProviderResult<PublishReceipt>;
}

/// Upload metadata applied to every published short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// YouTube category ("27" = Education)
    pub category_id: String,
    /// Privacy status: "public", "private", or "unlisted"
    pub privacy_status: String,
    /// Tags attached to each upload
    pub tags: Vec<String>,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            category_id: "27".to_string(),
            privacy_status: "public".to_string(),
            tags: vec![
                "shorts".to_string(),
                "ai".to_string(),
                "automation".to_string(),
                "educational".to_string(),
                "facts".to_string(),
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: ClientSecret,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// RFC 3339 expiry of the access token
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            // A minute of slack so a token never expires mid-upload
            Some(expiry) => expiry <= now + ChronoDuration::seconds(60),
            None => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

/// YouTube Data API v3 publisher.
pub struct YouTubePublisher {
    credentials_dir: PathBuf,
    settings: PublishSettings,
    client: Client,
    upload_base_url: String,
}

impl YouTubePublisher {
    /// Create a publisher reading credentials from `credentials_dir`.
    pub fn new(credentials_dir: impl Into<PathBuf>, settings: PublishSettings) -> Self {
        Self {
            credentials_dir: credentials_dir.into(),
            settings,
            client: Client::builder()
                .timeout(UPLOAD_TIMEOUT)
                .connect_timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
            upload_base_url: YOUTUBE_UPLOAD_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upload_base_url = base_url.into();
        self
    }

    /// Whether both credential files are present.
    pub fn credentials_available(&self) -> bool {
        self.credentials_dir.join(CLIENT_SECRET_FILE).exists()
            && self.credentials_dir.join(TOKEN_FILE).exists()
    }

    /// Load credentials, refreshing the access token when expired.
    async fn authorized_token(&self) -> ProviderResult<String> {
        let secret_path = self.credentials_dir.join(CLIENT_SECRET_FILE);
        let token_path = self.credentials_dir.join(TOKEN_FILE);

        if !secret_path.exists() {
            return Err(ProviderError::CredentialsMissing(format!(
                "{} not found",
                secret_path.display()
            )));
        }
        if !token_path.exists() {
            return Err(ProviderError::CredentialsMissing(format!(
                "{} not found (run the authorization flow once)",
                token_path.display()
            )));
        }

        let secret: ClientSecretFile =
            serde_json::from_slice(&tokio::fs::read(&secret_path).await?)?;
        let mut token: StoredToken = serde_json::from_slice(&tokio::fs::read(&token_path).await?)?;

        if token.is_expired(Utc::now()) {
            let refresh_token = token.refresh_token.clone().ok_or_else(|| {
                ProviderError::CredentialsMissing(
                    "Access token expired and no refresh token stored".to_string(),
                )
            })?;

            info!("Refreshing expired YouTube access token");
            let response = self
                .client
                .post(&secret.installed.token_uri)
                .form(&[
                    ("client_id", secret.installed.client_id.as_str()),
                    ("client_secret", secret.installed.client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                    ("grant_type", "refresh_token"),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::api(status, body));
            }

            let refreshed: RefreshResponse = response.json().await?;
            token.access_token = refreshed.access_token;
            token.expiry = refreshed
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs));

            // Persist so the next run reuses the fresh token
            tokio::fs::write(&token_path, serde_json::to_vec_pretty(&token)?).await?;
        }

        Ok(token.access_token)
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn upload(
        &self,
        video_path: &Path,
        title: &str,
        description: &str,
    ) -> ProviderResult<PublishReceipt> {
        if !video_path.exists() {
            return Err(ProviderError::ArtifactMissing(video_path.to_path_buf()));
        }

        let access_token = self.authorized_token().await?;

        let body = serde_json::json!({
            "snippet": {
                "title": title,
                "description": description,
                "tags": self.settings.tags,
                "categoryId": self.settings.category_id,
            },
            "status": {
                "privacyStatus": self.settings.privacy_status,
            },
        });

        // Step 1: open a resumable upload session
        let session = self
            .client
            .post(format!(
                "{}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status",
                self.upload_base_url
            ))
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await?;

        if !session.status().is_success() {
            let status = session.status().as_u16();
            let body = session.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        let location = session
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::EmptyResult("Resumable session missing Location header".to_string())
            })?;

        debug!("Resumable upload session opened");

        // Step 2: send the media body
        let bytes = tokio::fs::read(video_path).await?;
        let size = bytes.len();
        info!("Uploading {} bytes to YouTube", size);

        let response = self
            .client
            .put(&location)
            .bearer_auth(&access_token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        let uploaded: UploadResponse = response.json().await?;
        info!("Video uploaded: https://www.youtube.com/watch?v={}", uploaded.id);

        Ok(PublishReceipt {
            video_id: uploaded.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_credentials(dir: &Path, token_uri: &str, expiry: Option<DateTime<Utc>>) {
        std::fs::write(
            dir.join(CLIENT_SECRET_FILE),
            serde_json::json!({
                "installed": {
                    "client_id": "id",
                    "client_secret": "secret",
                    "token_uri": token_uri,
                }
            })
            .to_string(),
        )
        .unwrap();

        let token = StoredToken {
            access_token: "stale-or-fresh".to_string(),
            refresh_token: Some("refresh".to_string()),
            expiry,
        };
        std::fs::write(dir.join(TOKEN_FILE), serde_json::to_string(&token).unwrap()).unwrap();
    }

    #[test]
    fn test_token_expiry_slack() {
        let now = Utc::now();
        let fresh = StoredToken {
            access_token: "t".to_string(),
            refresh_token: None,
            expiry: Some(now + ChronoDuration::hours(1)),
        };
        assert!(!fresh.is_expired(now));

        let nearly = StoredToken {
            access_token: "t".to_string(),
            refresh_token: None,
            expiry: Some(now + ChronoDuration::seconds(30)),
        };
        assert!(nearly.is_expired(now));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_skippable() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("short.mp4");
        std::fs::write(&video, b"mp4").unwrap();

        let publisher =
            YouTubePublisher::new(dir.path().join("credentials"), PublishSettings::default());
        assert!(!publisher.credentials_available());

        let err = publisher.upload(&video, "t", "d").await.unwrap_err();
        assert!(err.is_credentials_missing());
    }

    #[tokio::test]
    async fn test_resumable_upload_flow() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("short.mp4");
        std::fs::write(&video, b"mp4-bytes").unwrap();

        write_credentials(
            dir.path(),
            &format!("{}/token", server.uri()),
            Some(Utc::now() + ChronoDuration::hours(1)),
        );

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("location", format!("{}/upload/session/1", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/upload/session/1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "abc123"})),
            )
            .mount(&server)
            .await;

        let publisher = YouTubePublisher::new(dir.path(), PublishSettings::default())
            .with_base_url(server.uri());

        let receipt = publisher.upload(&video, "Title", "Desc").await.unwrap();
        assert_eq!(receipt.video_id, "abc123");
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_and_persists() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("short.mp4");
        std::fs::write(&video, b"mp4-bytes").unwrap();

        write_credentials(
            dir.path(),
            &format!("{}/token", server.uri()),
            Some(Utc::now() - ChronoDuration::hours(1)),
        );

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("location", format!("{}/upload/session/2", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/upload/session/2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "xyz789"})),
            )
            .mount(&server)
            .await;

        let publisher = YouTubePublisher::new(dir.path(), PublishSettings::default())
            .with_base_url(server.uri());

        let receipt = publisher.upload(&video, "Title", "Desc").await.unwrap();
        assert_eq!(receipt.video_id, "xyz789");

        // The refreshed token was written back for the next run
        let stored: StoredToken =
            serde_json::from_slice(&std::fs::read(dir.path().join(TOKEN_FILE)).unwrap()).unwrap();
        assert_eq!(stored.access_token, "fresh-token");
    }
}

use super::{object_key, ObjectStorage, UploadError};
use crate::config::DriveConfig;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    parents: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct Permission {
    role: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Google Drive uploader
///
/// Each upload trades the configured refresh token for a short-lived access
/// token, creates the file directly inside the configured folder (metadata and
/// bytes in one multipart request) and opens it up for anonymous viewing.
pub struct DriveStorage {
    client: reqwest::Client,
    config: DriveConfig,
}

impl DriveStorage {
    pub fn new(config: DriveConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        info!(folder_id = %config.folder_id, "Drive uploader initialized");

        Ok(Self { client, config })
    }

    async fn access_token(&self) -> Result<String, UploadError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

        Ok(token.access_token)
    }

    async fn upload_media(
        &self,
        token: &str,
        bytes: Bytes,
        content_type: &str,
        name: &str,
    ) -> Result<String, UploadError> {
        let url = format!("{}/files?uploadType=multipart&fields=id", self.config.upload_url);
        let metadata = serde_json::to_string(&FileMetadata {
            name,
            parents: [self.config.folder_id.as_str()],
        })
        .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        let boundary = format!("wall-{}", uuid::Uuid::new_v4().simple());

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(related_body(&boundary, &metadata, content_type, &bytes))
            .send()
            .await?;

        let file: DriveFile = parse_json(response).await?;
        Ok(file.id)
    }

    async fn share_publicly(&self, token: &str, file_id: &str) -> Result<(), UploadError> {
        let url = format!("{}/files/{}/permissions", self.config.api_url, file_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&Permission {
                role: "reader",
                kind: "anyone",
            })
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// `multipart/related` body: JSON metadata part, then the media part
fn related_body(boundary: &str, metadata: &str, content_type: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{boundary}\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Direct-view URL for a Drive file shared with anyone
pub fn public_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={file_id}")
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UploadError::Rejected {
        status: status.as_u16(),
        body,
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UploadError> {
    ensure_success(response)
        .await?
        .json()
        .await
        .map_err(|e| UploadError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl ObjectStorage for DriveStorage {
    #[instrument(skip(self, bytes), fields(size_bytes = bytes.len()))]
    async fn store(
        &self,
        bytes: Bytes,
        content_type: &str,
        file_name: &str,
    ) -> Result<String, UploadError> {
        let key = object_key(file_name);
        let token = self.access_token().await?;

        let file_id = self.upload_media(&token, bytes, content_type, &key).await?;
        debug!(file_id = %file_id, key = %key, "Image created in Drive folder");

        self.share_publicly(&token, &file_id).await?;

        let url = public_url(&file_id);
        info!(file_id = %file_id, url = %url, "Image uploaded to Drive");

        Ok(url)
    }

    fn provider(&self) -> &'static str {
        "googledrive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::{patch, post},
        Form, Json, Router,
    };
    use std::collections::HashMap;

    async fn token(Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<serde_json::Value>) {
        if form.get("refresh_token").map(String::as_str) == Some("good-refresh") {
            (StatusCode::OK, Json(serde_json::json!({ "access_token": "tok-1", "expires_in": 3599 })))
        } else {
            (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "invalid_grant" })))
        }
    }

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
        headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
    }

    /// Accepts only a single multipart request that creates the file inside
    /// the folder; Drive refuses to give an existing file a second parent.
    async fn upload(
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let authorized = header(&headers, "authorization") == "Bearer tok-1";
        let related = header(&headers, "content-type").starts_with("multipart/related; boundary=");
        let body = String::from_utf8_lossy(&body);
        let in_folder = body.contains(r#""parents":["folder-9"]"#);
        let named = body.contains(r#".png","parents""#);
        let is_png = body.contains("Content-Type: image/png\r\n\r\n\x00PNG");

        if query.get("uploadType").map(String::as_str) != Some("multipart") || !related {
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({})));
        }
        if !authorized || !in_folder || !named || !is_png {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
        }
        (StatusCode::OK, Json(serde_json::json!({ "id": "file-42" })))
    }

    async fn add_parent(Query(query): Query<HashMap<String, String>>) -> StatusCode {
        if query.contains_key("addParents") && !query.contains_key("removeParents") {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::OK
        }
    }

    async fn permission(Json(perm): Json<serde_json::Value>) -> StatusCode {
        if perm["role"] == "reader" && perm["type"] == "anyone" {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    async fn fake_drive() -> String {
        let app = Router::new()
            .route("/token", post(token))
            .route("/upload/files", post(upload))
            .route("/api/files/:id", patch(add_parent))
            .route("/api/files/:id/permissions", post(permission));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config_for(base: &str, refresh_token: &str) -> DriveConfig {
        DriveConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: refresh_token.to_string(),
            folder_id: "folder-9".to_string(),
            token_url: format!("{base}/token"),
            api_url: format!("{base}/api"),
            upload_url: format!("{base}/upload"),
        }
    }

    #[test]
    fn test_related_body_layout() {
        let body = related_body("b1", r#"{"name":"k.png"}"#, "image/png", b"DATA");
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--b1\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"k.png\"}\r\n\
             --b1\r\nContent-Type: image/png\r\n\r\nDATA\r\n--b1--\r\n"
        );
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("abc"),
            "https://drive.google.com/uc?export=view&id=abc"
        );
    }

    #[tokio::test]
    async fn test_store_runs_full_upload_flow() {
        let base = fake_drive().await;
        let storage = DriveStorage::new(config_for(&base, "good-refresh")).unwrap();

        let url = storage
            .store(Bytes::from_static(b"\x00PNG...."), "image/png", "me.png")
            .await
            .unwrap();

        assert_eq!(url, "https://drive.google.com/uc?export=view&id=file-42");
        assert_eq!(storage.provider(), "googledrive");
    }

    #[tokio::test]
    async fn test_bad_refresh_token_is_auth_error() {
        let base = fake_drive().await;
        let storage = DriveStorage::new(config_for(&base, "revoked")).unwrap();

        let err = storage
            .store(Bytes::from_static(b"data"), "image/png", "me.png")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Auth(_)));
    }

    #[tokio::test]
    async fn test_rejected_upload_surfaces_status() {
        let base = fake_drive().await;
        let storage = DriveStorage::new(config_for(&base, "good-refresh")).unwrap();

        let err = storage
            .store(Bytes::from_static(b"\x00PNG...."), "image/gif", "me.gif")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Rejected { status: 401, .. }));
    }
}

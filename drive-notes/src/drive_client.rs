//! Typed HTTP client for the Google Drive v3 files API.
//!
//! Notes are plain-text files, optionally confined to one folder. Requests are
//! authorised with an OAuth access token minted from a long-lived refresh
//! token; the access token is cached and refreshed shortly before it expires.

use crate::config::DriveCredentials;
use crate::store::NoteStore;
use async_trait::async_trait;
use drive_notes_types::Note;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// How many seconds before expiry to proactively refresh.
const REFRESH_MARGIN_SECS: i64 = 60;

const NOTE_MIME_TYPE: &str = "text/plain";
const LIST_FIELDS: &str = "files(id, name, createdTime, modifiedTime)";
const FILE_FIELDS: &str = "id, name, modifiedTime";

// ── Drive API types ─────────────────────────────────

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<Note>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

#[derive(Debug, Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: i64,
}

impl AccessToken {
    fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at - REFRESH_MARGIN_SECS
    }
}

// ── Client impl ─────────────────────────────────────

pub struct DriveClient {
    client: reqwest::Client,
    credentials: DriveCredentials,
    folder_id: Option<String>,
    token: RwLock<Option<AccessToken>>,
}

impl DriveClient {
    pub fn new(credentials: DriveCredentials, folder_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            folder_id,
            token: RwLock::new(None),
        }
    }

    /// Get a valid access token, refreshing it as needed.
    async fn access_token(&self) -> Result<String, String> {
        // Fast path: read lock
        {
            let state = self.token.read().await;
            if let Some(ref t) = *state {
                if t.is_fresh(chrono::Utc::now().timestamp()) {
                    return Ok(t.token.clone());
                }
            }
        }

        // Slow path: another request may have refreshed while we waited
        let mut state = self.token.write().await;
        if let Some(ref t) = *state {
            if t.is_fresh(chrono::Utc::now().timestamp()) {
                return Ok(t.token.clone());
            }
        }

        let fresh = self.refresh_access_token().await?;
        let token = fresh.token.clone();
        *state = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token (e.g. on 401 from Drive).
    async fn invalidate_token(&self) {
        *self.token.write().await = None;
        log::info!("[DRIVE] Access token invalidated");
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, String> {
        log::info!("[DRIVE] Refreshing OAuth access token");

        let resp = self
            .client
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| format!("Token refresh failed: {}", e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("Failed to read token response: {}", e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(format!("Token refresh HTTP {}: {}", status, detail));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| format!("Parse token response: {}", e))?;

        Ok(AccessToken {
            token: token.access_token,
            expires_at: chrono::Utc::now().timestamp() + token.expires_in,
        })
    }

    /// Turn a non-success response into an error message, dropping the token on 401.
    async fn failure(&self, resp: reqwest::Response, what: &str) -> String {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        let body = resp.text().await.unwrap_or_default();
        format!("{} HTTP {}: {}", what, status, body)
    }
}

#[async_trait]
impl NoteStore for DriveClient {
    async fn list_notes(&self) -> Result<Vec<Note>, String> {
        let token = self.access_token().await?;
        let query = list_query(self.folder_id.as_deref());

        let resp = self
            .client
            .get(format!("{}/files", DRIVE_API))
            .bearer_auth(&token)
            .query(&[
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("orderBy", "modifiedTime desc"),
            ])
            .send()
            .await
            .map_err(|e| format!("List files failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(self.failure(resp, "List files").await);
        }

        resp.json::<FileList>()
            .await
            .map(|list| list.files)
            .map_err(|e| format!("Parse file list: {}", e))
    }

    async fn read_content(&self, id: &str) -> Result<String, String> {
        let token = self.access_token().await?;

        let resp = self
            .client
            .get(format!("{}/files/{}", DRIVE_API, id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| format!("Read file failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(self.failure(resp, "Read file").await);
        }

        resp.text()
            .await
            .map_err(|e| format!("Read file body: {}", e))
    }

    async fn create_note(&self, name: &str, content: &str) -> Result<Note, String> {
        let token = self.access_token().await?;

        let metadata = FileMetadata {
            name,
            mime_type: NOTE_MIME_TYPE,
            parents: self.folder_id.as_deref().map(|f| vec![f]),
        };
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| format!("Encode file metadata: {}", e))?;

        let boundary = format!("drive-notes-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_body(&boundary, &metadata_json, content);

        let resp = self
            .client
            .post(format!("{}/files", DRIVE_UPLOAD_API))
            .bearer_auth(&token)
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| format!("Create file failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(self.failure(resp, "Create file").await);
        }

        let note = resp
            .json::<Note>()
            .await
            .map_err(|e| format!("Parse created file: {}", e))?;

        log::info!("[DRIVE] Created {} ({})", note.name, note.id);
        Ok(note)
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<(), String> {
        let token = self.access_token().await?;

        let resp = self
            .client
            .patch(format!("{}/files/{}", DRIVE_UPLOAD_API, id))
            .bearer_auth(&token)
            .query(&[("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, NOTE_MIME_TYPE)
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| format!("Update file failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(self.failure(resp, "Update file").await);
        }
        Ok(())
    }

    async fn rename_note(&self, id: &str, name: &str) -> Result<(), String> {
        let token = self.access_token().await?;

        let resp = self
            .client
            .patch(format!("{}/files/{}", DRIVE_API, id))
            .bearer_auth(&token)
            .json(&RenameBody { name })
            .send()
            .await
            .map_err(|e| format!("Rename file failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(self.failure(resp, "Rename file").await);
        }
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<(), String> {
        let token = self.access_token().await?;

        let resp = self
            .client
            .delete(format!("{}/files/{}", DRIVE_API, id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| format!("Delete file failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(self.failure(resp, "Delete file").await);
        }

        log::info!("[DRIVE] Deleted {}", id);
        Ok(())
    }
}

/// Drive search query selecting live plain-text files, optionally in one folder
fn list_query(folder_id: Option<&str>) -> String {
    let mut q = format!("mimeType = '{}' and trashed = false", NOTE_MIME_TYPE);
    if let Some(folder) = folder_id {
        q.push_str(&format!(" and '{}' in parents", folder.replace('\'', "\\'")));
    }
    q
}

/// `multipart/related` body carrying file metadata followed by file content
fn multipart_body(boundary: &str, metadata_json: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
         --{b}\r\nContent-Type: {mime}\r\n\r\n{content}\r\n--{b}--",
        b = boundary,
        meta = metadata_json,
        mime = NOTE_MIME_TYPE,
        content = content,
    )
}

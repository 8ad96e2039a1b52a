use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Ack, Download, FileUpload, NoteSelector, RemoteStore, UploadReceipt};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{EntityId, LibraryFile, Note, ResultsLimit, SearchHit, SearchResponse};
use crate::session::Session;
use crate::util::{compact_text, content_disposition_filename};

/// Unscoped backend client.
///
/// Handles the calls that happen before or outside a session (user check,
/// feedback) and hands out session-scoped [`HttpRemoteStore`]s.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &ClientConfig, client: Client) -> Self {
        Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the backend already holds a library for `username`.
    pub async fn check_user_exists(&self, username: &str) -> Result<bool> {
        let request = self
            .client
            .post(self.endpoint("/api/check_user"))
            .form(&[("username", username)]);
        let payload: UserExists = read_json(request).await?;
        Ok(payload.exists)
    }

    /// Send a feedback message; delivery is configured on the backend.
    pub async fn submit_feedback(&self, email: &str, message: &str) -> Result<Ack> {
        let body = serde_json::json!({
            "email": email,
            "context": message,
        });
        let request = self
            .client
            .post(self.endpoint("/api/send-email"))
            .json(&body);
        read_json(request).await
    }

    /// Bind a session; the returned store scopes every call to its username.
    pub fn scoped(&self, session: Session) -> HttpRemoteStore {
        HttpRemoteStore {
            backend: self.clone(),
            session,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Session-scoped HTTP implementation of [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    backend: HttpBackend,
    session: Session,
}

impl HttpRemoteStore {
    fn username(&self) -> &str {
        self.session.username()
    }

    fn client(&self) -> &Client {
        &self.backend.client
    }

    fn endpoint(&self, path: &str) -> String {
        self.backend.endpoint(path)
    }
}

impl RemoteStore for HttpRemoteStore {
    fn session(&self) -> &Session {
        &self.session
    }

    async fn list_files(&self) -> Result<Vec<LibraryFile>> {
        let request = self
            .client()
            .get(self.endpoint("/api/files"))
            .query(&[("username", self.username())]);
        let files: Option<Vec<LibraryFile>> = read_json(request).await?;
        Ok(files.unwrap_or_default())
    }

    async fn create_file(&self, file: &LibraryFile) -> Result<Ack> {
        let body = with_username(file, self.username())?;
        let request = self.client().post(self.endpoint("/api/files")).json(&body);
        read_json(request).await
    }

    async fn delete_file(&self, file: &LibraryFile) -> Result<Ack> {
        let request = if file.is_uploaded() {
            let path = format!(
                "/api/files/delete/{}",
                urlencoding::encode(&file.id.to_string())
            );
            self.client()
                .delete(self.endpoint(&path))
                .query(&[("username", self.username())])
        } else {
            let body = serde_json::json!({
                "id": file.id,
                "username": self.username(),
            });
            self.client().delete(self.endpoint("/api/files")).json(&body)
        };
        read_json(request).await
    }

    async fn upload_file(&self, upload: &FileUpload) -> Result<UploadReceipt> {
        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("username", self.username().to_string());
        let request = self
            .client()
            .post(self.endpoint("/api/upload"))
            .multipart(form);
        read_json(request).await
    }

    async fn list_notes(&self, file_id: Option<&EntityId>) -> Result<Vec<Note>> {
        let mut query = vec![("username", self.username().to_string())];
        if let Some(file_id) = file_id {
            query.push(("fileId", file_id.to_string()));
        }
        let request = self
            .client()
            .get(self.endpoint("/api/notes"))
            .query(&query);
        let notes: Option<Vec<Note>> = read_json(request).await?;
        Ok(notes.unwrap_or_default())
    }

    async fn create_note(&self, note: &Note) -> Result<Ack> {
        let body = with_username(note, self.username())?;
        let request = self.client().post(self.endpoint("/api/notes")).json(&body);
        read_json(request).await
    }

    async fn delete_notes(&self, selector: &NoteSelector) -> Result<Ack> {
        let body = match selector {
            NoteSelector::ById(id) => serde_json::json!({
                "id": id,
                "username": self.username(),
            }),
            NoteSelector::ByFile(file_id) => serde_json::json!({
                "fileId": file_id,
                "username": self.username(),
            }),
        };
        let request = self
            .client()
            .delete(self.endpoint("/api/notes"))
            .json(&body);
        read_json(request).await
    }

    async fn search(&self, query: &str, limit: ResultsLimit) -> Result<Vec<SearchHit>> {
        let body = SearchRequest {
            query,
            results_per_page: limit.as_count(),
            username: self.username(),
        };
        let request = self.client().post(self.endpoint("/api/ask")).json(&body);
        let response: SearchResponse = read_json(request).await?;
        Ok(response.results)
    }

    async fn download_file(&self, file_id: &EntityId) -> Result<Download> {
        let path = format!(
            "/api/download/{}",
            urlencoding::encode(&file_id.to_string())
        );
        let request = self
            .client()
            .get(self.endpoint(&path))
            .query(&[("username", self.username())]);
        let response = ensure_success(request.send().await?).await?;

        let headers = response.headers();
        let file_name = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(Download {
            file_name,
            content_type,
            bytes,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    results_per_page: u32,
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserExists {
    #[serde(default)]
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Serialize `value` as a JSON object with a `username` field added.
fn with_username<T: Serialize>(value: &T, username: &str) -> Result<serde_json::Value> {
    let mut body = serde_json::to_value(value)?;
    if let Some(object) = body.as_object_mut() {
        object.insert(
            "username".to_string(),
            serde_json::Value::String(username.to_string()),
        );
    }
    Ok(body)
}

async fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = ensure_success(request.send().await?).await?;
    Ok(response.json::<T>().await?)
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .unwrap_or_else(|| {
            let compact = compact_text(&body);
            if compact.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                compact
            }
        });
    tracing::debug!(status = status.as_u16(), "Backend request failed: {}", message);
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    #[test]
    fn with_username_extends_object() {
        let note = Note::free("idea");
        let body = with_username(&note, "alice").unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["type"], "free");
        assert_eq!(body["content"], "idea");
    }

    #[test]
    fn search_request_uses_camel_case() {
        let body = serde_json::to_value(SearchRequest {
            query: "pain",
            results_per_page: 100,
            username: "alice",
        })
        .unwrap();
        assert_eq!(body["resultsPerPage"], 100);
    }

    #[test]
    fn backend_trims_trailing_slash() {
        let config = ClientConfig::default().with_server_url("http://localhost:5000/".to_string());
        let backend = HttpBackend::with_client(&config, Client::new());
        assert_eq!(backend.base_url(), "http://localhost:5000");
    }
}

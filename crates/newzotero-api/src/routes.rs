use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{DefaultBodyLimit, Multipart, OriginalUri, Path, Query, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::upstream::Upstream;

const JSON: &str = "application/json";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    upstream: Upstream,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, AppError> {
        Ok(Self {
            upstream: Upstream::from_config(&config)?,
            config,
        })
    }
}

pub fn app_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    let api_routes = Router::new()
        .route("/notes", get(forward).post(forward).delete(forward))
        .route("/files", get(forward).post(forward).delete(forward))
        .route("/ask", post(forward))
        .route("/check_user", post(check_user))
        .route("/upload", post(upload).layer(upload_limit))
        .route("/files/delete/{file_id}", delete(delete_uploaded_file))
        .route("/download/{file_id}", get(download))
        .route("/send-email", post(send_email));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

/// Forward method, query and body verbatim; relay status and JSON.
async fn forward(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = match uri.query() {
        Some(query) => format!("{}?{query}", uri.path()),
        None => uri.path().to_string(),
    };
    let mut request = state.upstream.request(method, &path);
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        request = request.header(header::CONTENT_TYPE, content_type.clone());
    }
    let reply = state.upstream.send(request.body(body)).await?;
    Ok(reply.relay(JSON, &[]))
}

#[derive(Debug, Deserialize)]
struct CheckUserForm {
    #[serde(default)]
    username: String,
}

async fn check_user(
    State(state): State<AppState>,
    form: Result<Form<CheckUserForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form?;
    let request = state
        .upstream
        .request(Method::POST, "/api/check_user")
        .form(&[("username", form.username.as_str())]);
    let reply = state.upstream.send(request).await?;
    Ok(reply.relay(JSON, &[]))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut file = None;
    let mut username = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, content_type, bytes));
            }
            Some("username") => {
                let value = field.text().await?;
                username = Some(value).filter(|value| !value.trim().is_empty());
            }
            _ => {}
        }
    }

    let (Some((file_name, content_type, bytes)), Some(username)) = (file, username) else {
        return Err(AppError::bad_request("File or username is missing"));
    };

    let part = reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name(file_name.clone())
        .mime_str(&content_type)
        .map_err(|_| AppError::bad_request(format!("Invalid content type: {content_type}")))?;
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("username", username);
    let request = state
        .upstream
        .request(Method::POST, "/api/upload")
        .multipart(form);

    let reply = state
        .upstream
        .send(request)
        .await?
        .error_for_status("Backend upload failed")?;
    tracing::info!(file = %file_name, size = bytes.len(), "Forwarded upload");
    Ok(reply.relay(JSON, &[]))
}

#[derive(Debug, Deserialize)]
struct UsernameQuery {
    username: Option<String>,
}

impl UsernameQuery {
    fn require(self) -> Result<String, AppError> {
        self.username
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("Username is missing"))
    }
}

async fn delete_uploaded_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<UsernameQuery>,
) -> Result<Response, AppError> {
    let username = query.require()?;
    let path = format!("/api/files/delete/{}", urlencoding::encode(&file_id));
    let request = state
        .upstream
        .request(Method::DELETE, &path)
        .query(&[("username", username.as_str())]);

    let reply = state
        .upstream
        .send(request)
        .await?
        .error_for_status("Delete failed")?;
    Ok(reply.relay(JSON, &[]))
}

async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<UsernameQuery>,
) -> Result<Response, AppError> {
    let username = query.require()?;
    let path = format!("/api/download/{}", urlencoding::encode(&file_id));
    let request = state
        .upstream
        .request(Method::GET, &path)
        .query(&[("username", username.as_str())]);

    let reply = state
        .upstream
        .send(request)
        .await?
        .error_for_status("Download failed")?;
    Ok(reply.relay("application/octet-stream", &[header::CONTENT_DISPOSITION]))
}

#[derive(Debug, Serialize, Deserialize)]
struct FeedbackRequest {
    email: String,
    context: String,
}

async fn send_email(
    State(state): State<AppState>,
    feedback: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(feedback) = feedback?;
    let request = state
        .upstream
        .request(Method::POST, "/api/send-email")
        .json(&feedback);
    let reply = state.upstream.send(request).await?;
    Ok(reply.relay(JSON, &[]))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, body_string, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

    fn router_for(server_url: String) -> Router {
        router_with_upload_limit(server_url, DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn router_with_upload_limit(server_url: String, max_upload_bytes: usize) -> Router {
        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            server_url,
            upstream_timeout: Duration::from_secs(5),
            max_upload_bytes,
        });
        app_router(AppState::from_config(config).unwrap())
    }

    fn multipart_upload(boundary: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"username\"\r\n\r\nalice\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn healthz_reports_ok() {
        let response = router_for("http://127.0.0.1:9".to_string())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn notes_are_forwarded_with_query_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notes"))
            .and(query_param("username", "alice"))
            .and(query_param("fileId", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "n1", "fileId": 1, "content": "x", "type": "abstract"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let response = router_for(server.uri())
            .oneshot(
                Request::get("/api/notes?username=alice&fileId=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await[0]["id"], "n1");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn note_delete_body_is_forwarded_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/notes"))
            .and(body_partial_json(serde_json::json!({"fileId": 3, "username": "alice"})))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "Note not found"})),
            )
            .mount(&server)
            .await;

        let response = router_for(server.uri())
            .oneshot(
                Request::delete("/api/notes")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"fileId":3,"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Note not found");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn check_user_is_forwarded_as_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check_user"))
            .and(body_string("username=alice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"exists": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = router_for(server.uri())
            .oneshot(
                Request::post("/api/check_user")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("username=alice"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(json_body(response).await["exists"], false);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn uploaded_file_delete_requires_username() {
        let response = router_for("http://127.0.0.1:9".to_string())
            .oneshot(
                Request::delete("/api/files/delete/local-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Username is missing");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upstream_error_keeps_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/files/delete/local-1"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"error": "Not your file"})),
            )
            .mount(&server)
            .await;

        let response = router_for(server.uri())
            .oneshot(
                Request::delete("/api/files/delete/local-1?username=alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not your file");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn download_relays_bytes_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/download/local-1"))
            .and(query_param("username", "alice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"paper.pdf\"")
                    .set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let response = router_for(server.uri())
            .oneshot(
                Request::get("/api/download/local-1?username=alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"paper.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upload_without_file_is_rejected() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"username\"\r\n\r\n\
             alice\r\n--{boundary}--\r\n"
        );
        let response = router_for("http://127.0.0.1:9".to_string())
            .oneshot(
                Request::post("/api/upload")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "File or username is missing");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upload_larger_than_two_megabytes_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "fileId": "up-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pdf = vec![b'x'; 3 * 1024 * 1024];
        let response = router_for(server.uri())
            .oneshot(multipart_upload("XBOUNDARY", "paper.pdf", &pdf))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["fileId"], "up-1");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upload_over_configured_limit_is_payload_too_large() {
        let response = router_with_upload_limit("http://127.0.0.1:9".to_string(), 1024)
            .oneshot(multipart_upload("XBOUNDARY", "paper.pdf", &[b'x'; 4096]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed upload"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn feedback_without_email_is_rejected_as_json() {
        let response = router_for("http://127.0.0.1:9".to_string())
            .oneshot(
                Request::post("/api/send-email")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"context":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("email"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn check_user_with_wrong_content_type_is_rejected_as_json() {
        let response = router_for("http://127.0.0.1:9".to_string())
            .oneshot(
                Request::post("/api/check_user")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreachable_backend_is_bad_gateway() {
        let response = router_for("http://127.0.0.1:9".to_string())
            .oneshot(
                Request::post("/api/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"x","resultsPerPage":5,"username":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["success"], false);
    }
}

//! Client for the résumé service: text extraction, gap analysis and PDF generation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: u16,
        message: String,
    },
    #[error("{endpoint} response has no `{field}` field")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("generated document is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

const EXTRACT_RESUME: &str = "/extract_resume";
const ANALYZE: &str = "/analyze";
const GENERATE_PDF: &str = "/generate_pdf";

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ServiceError::Transport { endpoint: "client", source })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload a PDF and get its plain text back.
    pub async fn extract_resume(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ServiceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());
        info!("Uploading {} ({} bytes) for text extraction", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|source| ServiceError::Transport { endpoint: EXTRACT_RESUME, source })?;
        let body = self.post(EXTRACT_RESUME, Form::new().part("resume", part)).await?;
        string_field(&body, EXTRACT_RESUME, "resume_text")
    }

    /// Suggestion text; missing items are the lines starting with `•`.
    pub async fn analyze(&self, resume_text: &str, job_description: &str) -> Result<String> {
        let form = Form::new()
            .text("resume_text", resume_text.to_string())
            .text("job_description", job_description.to_string());
        let body = self.post(ANALYZE, form).await?;
        string_field(&body, ANALYZE, "suggestions")
    }

    /// Render edited résumé text into a PDF.
    pub async fn generate_pdf(&self, text: &str) -> Result<Vec<u8>> {
        let body = self
            .post(GENERATE_PDF, Form::new().text("text", text.to_string()))
            .await?;
        let encoded = string_field(&body, GENERATE_PDF, "pdf")?;
        Ok(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?)
    }

    async fn post(&self, endpoint: &'static str, form: Form) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { endpoint, source })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ServiceError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint,
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|_| ServiceError::Status {
            endpoint,
            status: status.as_u16(),
            message: format!("expected JSON, got: {}", snippet(&text)),
        })
    }
}

fn string_field(body: &Value, endpoint: &'static str, field: &'static str) -> Result<String> {
    body.get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(ServiceError::MissingField { endpoint, field })
}

/// The service reports failures as `{"error": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| snippet(body))
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= 200 {
        trimmed.to_string()
    } else {
        format!("{}...", trimmed.chars().take(200).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> ServiceClient {
        ServiceClient::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn extract_resume_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract_resume"))
            .and(body_string_contains("name=\"resume\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "resume_text": "Jane Doe\nRust engineer" })),
            )
            .mount(&server)
            .await;

        let mut pdf = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        pdf.write_all(b"%PDF-1.4 fake").unwrap();

        let text = client(&server).await.extract_resume(pdf.path()).await.unwrap();
        assert_eq!(text, "Jane Doe\nRust engineer");
    }

    #[tokio::test]
    async fn missing_upload_is_io_error() {
        let server = MockServer::start().await;
        let err = client(&server)
            .await
            .extract_resume(Path::new("/no/such/resume.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io { .. }));
    }

    #[tokio::test]
    async fn analyze_sends_both_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_string_contains("name=\"resume_text\""))
            .and(body_string_contains("name=\"job_description\""))
            .and(body_string_contains("Kubernetes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "suggestions": "Consider adding:\n\n• Kubernetes" }),
            ))
            .mount(&server)
            .await;

        let out = client(&server)
            .await
            .analyze("Rust, Postgres", "• Kubernetes")
            .await
            .unwrap();
        assert!(out.contains("• Kubernetes"));
    }

    #[tokio::test]
    async fn service_error_message_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error": "Job description is required." })),
            )
            .mount(&server)
            .await;

        let err = client(&server).await.analyze("r", "").await.unwrap_err();
        match err {
            ServiceError::Status { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Job description is required.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_field_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client(&server).await.analyze("r", "j").await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingField { field: "suggestions", .. }));
    }

    #[tokio::test]
    async fn generate_pdf_decodes_base64() {
        let server = MockServer::start().await;
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4");
        Mock::given(method("POST"))
            .and(path("/generate_pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "pdf": encoded })))
            .mount(&server)
            .await;

        let bytes = client(&server).await.generate_pdf("Jane Doe").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn bad_base64_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "pdf": "***" })))
            .mount(&server)
            .await;

        let err = client(&server).await.generate_pdf("x").await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message(r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_message("  Internal Server Error "), "Internal Server Error");
    }
}

use std::path::PathBuf;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use andon_core::draft::{evidence_mime, EvidencePayload, TicketUpdate};
use andon_core::types::{ListEnvelope, ListQuery, Ticket, UpdateResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_LIMIT: usize = 200;

pub const LIST_PATH: &str = "/get-andon-security";
pub const UPDATE_PATH: &str = "/update-andon-security";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ticket service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("failed to read evidence file {}: {source}", .path.display())]
    Evidence {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApiError {
    /// Transport-level failures (DNS, refused connection, timeout) as
    /// opposed to responses the service produced.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Request(_))
    }

    /// Short form suitable for an inline banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Evidence { path, .. } => {
                format!("Could not read evidence file {}", path.display())
            }
            other => other.to_string(),
        }
    }
}

/// HTTP client for the andon security-ticket service.
#[derive(Debug, Clone)]
pub struct TicketApi {
    client: reqwest::Client,
    base_url: String,
}

impl TicketApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the ticket collection for one filter window.
    pub async fn list_tickets(&self, query: &ListQuery) -> Result<Vec<Ticket>, ApiError> {
        let url = format!("{}{}", self.base_url, LIST_PATH);
        let response = self
            .client
            .get(&url)
            .query(&query.params())
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let envelope: ListEnvelope = response.json().await?;
        Ok(envelope.results)
    }

    /// Submit one ticket update as a multipart form. Field layout follows
    /// the evidence payload: an attached file is streamed under
    /// `evidence_file`, a preserved upload goes out as its stored path.
    pub async fn update_ticket(&self, update: &TicketUpdate) -> Result<UpdateResponse, ApiError> {
        let mut form = Form::new()
            .text("id_ticket", update.id_ticket.to_string())
            .text("department", update.department.clone())
            .text("pic_security", update.pic_security.clone())
            .text("status_ticket", update.status_ticket.code().to_string())
            .text("updated_at", update.updated_at.clone());

        match &update.evidence {
            EvidencePayload::Attached {
                file_name,
                path,
                evidence_updated,
            } => {
                let bytes = tokio::fs::read(path).await.map_err(|source| {
                    ApiError::Evidence {
                        path: path.clone(),
                        source,
                    }
                })?;
                let part = Part::bytes(bytes)
                    .file_name(file_name.clone())
                    .mime_str(evidence_mime(file_name))?;
                form = form
                    .part("evidence_file", part)
                    .text("evidence_updated", evidence_updated.clone());
            }
            EvidencePayload::Preserved {
                evidence_uploaded,
                evidence_updated,
            } => {
                form = form
                    .text("evidence_uploaded", evidence_uploaded.clone())
                    .text("evidence_updated", evidence_updated.clone());
            }
            EvidencePayload::Omitted => {}
        }

        let url = format!("{}{}", self.base_url, UPDATE_PATH);
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }
        Ok(response.json().await?)
    }

    /// Public URL of a stored evidence image.
    pub fn evidence_url(&self, uploaded: &str) -> String {
        format!("{}/{}", self.base_url, uploaded.trim_start_matches('/'))
    }

    /// Cheap reachability check used while waiting out a transport outage.
    /// Any response from the host counts, error statuses included.
    pub async fn probe(&self) -> bool {
        self.client.get(&self.base_url).send().await.is_ok()
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

fn status_error(status: StatusCode, body: &str) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        body: truncate_body(body),
    }
}

/// Prefer a server-supplied `message` field, fall back to a generic line.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| "Failed to update ticket".to_string())
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        body.to_string()
    } else {
        let prefix: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api = TicketApi::new("http://portal.example:3008/");
        assert_eq!(api.base_url(), "http://portal.example:3008");
    }

    #[test]
    fn test_evidence_url_joins_stored_path() {
        let api = TicketApi::new("http://portal.example:3008");
        assert_eq!(
            api.evidence_url("evidence/1024.jpg"),
            "http://portal.example:3008/evidence/1024.jpg"
        );
        assert_eq!(
            api.evidence_url("/evidence/1024.jpg"),
            "http://portal.example:3008/evidence/1024.jpg"
        );
    }

    #[test]
    fn test_rejection_message_prefers_server_field() {
        assert_eq!(
            rejection_message(r#"{"message": "Ticket already closed"}"#),
            "Ticket already closed"
        );
        assert_eq!(rejection_message(r#"{"message": ""}"#), "Failed to update ticket");
        assert_eq!(rejection_message("<html>oops</html>"), "Failed to update ticket");
        assert_eq!(rejection_message(""), "Failed to update ticket");
    }

    #[test]
    fn test_error_body_truncated() {
        let long = "x".repeat(500);
        let err = status_error(StatusCode::BAD_GATEWAY, &long);
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.len() <= ERROR_BODY_LIMIT + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transport_classification() {
        let err: ApiError = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into();
        assert!(err.is_transport());

        let rejected = ApiError::Rejected {
            status: 422,
            message: "nope".to_string(),
        };
        assert!(!rejected.is_transport());
        assert_eq!(rejected.user_message(), "nope");
    }
}

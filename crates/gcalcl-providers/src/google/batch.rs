//! Batch request codec for the Google Calendar API.
//!
//! A batch is a single `multipart/mixed` POST whose parts are embedded HTTP
//! requests. Each part carries a `Content-ID` header; the server echoes it
//! back as `response-<id>` on the matching response part.

use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Batch endpoint for Calendar API v3.
pub const BATCH_URL: &str = "https://www.googleapis.com/batch/calendar/v3";

/// Path prefix of requests embedded in a batch.
pub const BATCH_PATH_PREFIX: &str = "/calendar/v3";

/// A batch request under construction.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    boundary: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone)]
struct RequestPart {
    content_id: String,
    method: &'static str,
    path: String,
}

impl BatchRequest {
    /// Creates an empty batch with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("batch_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Creates an empty batch with the given boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Adds a `POST` part. `path` is relative to `/calendar/v3`.
    pub fn post(&mut self, content_id: impl Into<String>, path: impl Into<String>) {
        self.push(content_id.into(), "POST", path.into());
    }

    /// Adds a `DELETE` part. `path` is relative to `/calendar/v3`.
    pub fn delete(&mut self, content_id: impl Into<String>, path: impl Into<String>) {
        self.push(content_id.into(), "DELETE", path.into());
    }

    fn push(&mut self, content_id: String, method: &'static str, path: String) {
        self.parts.push(RequestPart {
            content_id,
            method,
            path,
        });
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true when the batch has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Content-IDs of the parts, in order.
    pub fn content_ids(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.content_id.as_str())
    }

    /// Value of the `Content-Type` header for the outer request.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Encodes the multipart body.
    pub fn body(&self) -> String {
        let mut body = String::new();
        for part in &self.parts {
            body.push_str(&format!("--{}\r\n", self.boundary));
            body.push_str("Content-Type: application/http\r\n");
            body.push_str(&format!("Content-ID: <{}>\r\n\r\n", part.content_id));
            body.push_str(&format!(
                "{} {}{} HTTP/1.1\r\n\r\n",
                part.method, BATCH_PATH_PREFIX, part.path
            ));
        }
        body.push_str(&format!("--{}--\r\n", self.boundary));
        body
    }
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// One response inside a batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePart {
    /// Correlation id of the request, with the `response-` prefix removed.
    pub content_id: Option<String>,
    /// HTTP status of the embedded response.
    pub status: u16,
    /// Body of the embedded response.
    pub body: String,
}

impl ResponsePart {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Extracts the multipart boundary from a `Content-Type` header value.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').map(str::trim).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Parses a batch response body.
pub fn parse_response(content_type: &str, body: &str) -> ProviderResult<Vec<ResponsePart>> {
    let boundary = boundary_from_content_type(content_type).ok_or_else(|| {
        ProviderError::invalid_response(format!(
            "batch response has no boundary: {}",
            content_type
        ))
    })?;

    let normalized = body.replace("\r\n", "\n");
    let delimiter = format!("--{}", boundary);

    let mut parts = Vec::new();
    // The first chunk is the preamble; a chunk starting with "--" follows the
    // closing delimiter.
    for chunk in normalized.split(delimiter.as_str()).skip(1) {
        if chunk.starts_with("--") {
            break;
        }
        parts.push(parse_part(chunk)?);
    }

    debug!("parsed {} batch response parts", parts.len());
    Ok(parts)
}

fn parse_part(chunk: &str) -> ProviderResult<ResponsePart> {
    let chunk = chunk.trim_start_matches('\n');
    let (outer_headers, http) = chunk
        .split_once("\n\n")
        .ok_or_else(|| ProviderError::invalid_response("batch part has no body"))?;

    let content_id = outer_headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-id")
            .then(|| normalize_content_id(value))
    });

    let http = http.trim_start_matches('\n');
    let (status_line, rest) = http.split_once('\n').unwrap_or((http, ""));
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "invalid status line in batch part: {}",
                status_line
            ))
        })?;

    let body = rest
        .split_once("\n\n")
        .map(|(_, body)| body.trim().to_string())
        .unwrap_or_default();

    Ok(ResponsePart {
        content_id,
        status,
        body,
    })
}

fn normalize_content_id(value: &str) -> String {
    let id = value.trim().trim_start_matches('<').trim_end_matches('>');
    id.strip_prefix("response-").unwrap_or(id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn encodes_parts_in_order() {
        let mut batch = BatchRequest::with_boundary("batch_test");
        batch.post(
            "insert-request0",
            "/calendars/primary/events/quickAdd?text=Lunch%20at%20noon",
        );
        batch.delete("delete-request1", "/calendars/primary/events/abc");

        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.content_ids().collect::<Vec<_>>(),
            vec!["insert-request0", "delete-request1"]
        );
        assert_eq!(batch.content_type(), "multipart/mixed; boundary=batch_test");

        let body = batch.body().replace("\r\n", "\n");
        assert_snapshot!(body, @r"
--batch_test
Content-Type: application/http
Content-ID: <insert-request0>

POST /calendar/v3/calendars/primary/events/quickAdd?text=Lunch%20at%20noon HTTP/1.1

--batch_test
Content-Type: application/http
Content-ID: <delete-request1>

DELETE /calendar/v3/calendars/primary/events/abc HTTP/1.1

--batch_test--
");
    }

    #[test]
    fn body_uses_crlf() {
        let mut batch = BatchRequest::with_boundary("b");
        batch.delete("d0", "/calendars/primary/events/x");
        assert!(batch.body().starts_with("--b\r\nContent-Type: application/http\r\n"));
        assert!(batch.body().ends_with("--b--\r\n"));
    }

    #[test]
    fn random_boundaries_differ() {
        assert_ne!(BatchRequest::new().content_type(), BatchRequest::new().content_type());
    }

    #[test]
    fn boundary_extraction() {
        assert_eq!(
            boundary_from_content_type("multipart/mixed; boundary=batch_abc"),
            Some("batch_abc".to_string())
        );
        assert_eq!(
            boundary_from_content_type("multipart/mixed; charset=UTF-8; Boundary=\"q\""),
            Some("q".to_string())
        );
        assert_eq!(boundary_from_content_type("application/json"), None);
    }

    #[test]
    fn parses_mixed_response() {
        let body = "--batch_xyz\r\n\
Content-Type: application/http\r\n\
Content-ID: <response-insert-request0>\r\n\
\r\n\
HTTP/1.1 200 OK\r\n\
Content-Type: application/json; charset=UTF-8\r\n\
\r\n\
{\"id\": \"evt1\", \"summary\": \"Lunch\"}\r\n\
--batch_xyz\r\n\
Content-Type: application/http\r\n\
Content-ID: <response-insert-request1>\r\n\
\r\n\
HTTP/1.1 400 Bad Request\r\n\
Content-Type: application/json; charset=UTF-8\r\n\
\r\n\
{\"error\": {\"code\": 400}}\r\n\
--batch_xyz\r\n\
Content-Type: application/http\r\n\
Content-ID: <response-delete-request0>\r\n\
\r\n\
HTTP/1.1 204 No Content\r\n\
\r\n\
\r\n\
--batch_xyz--\r\n";

        let parts = parse_response("multipart/mixed; boundary=batch_xyz", body).unwrap();
        assert_eq!(parts.len(), 3);

        assert_eq!(parts[0].content_id.as_deref(), Some("insert-request0"));
        assert_eq!(parts[0].status, 200);
        assert!(parts[0].is_success());
        assert_eq!(parts[0].body, "{\"id\": \"evt1\", \"summary\": \"Lunch\"}");

        assert_eq!(parts[1].content_id.as_deref(), Some("insert-request1"));
        assert_eq!(parts[1].status, 400);
        assert!(!parts[1].is_success());

        assert_eq!(parts[2].content_id.as_deref(), Some("delete-request0"));
        assert_eq!(parts[2].status, 204);
        assert!(parts[2].body.is_empty());
    }

    #[test]
    fn missing_boundary_is_an_error() {
        assert!(parse_response("application/json", "{}").is_err());
    }

    #[test]
    fn bad_status_line_is_an_error() {
        let body = "--b\nContent-Type: application/http\n\nnot http\n--b--\n";
        assert!(parse_response("multipart/mixed; boundary=b", body).is_err());
    }
}

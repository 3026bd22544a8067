//! OData `$batch` changeset for the processed-marker write-back
//!
//! All updates go into one changeset, which Dataverse applies as a single
//! transaction. The response is a multipart document with one HTTP status
//! line per operation, or a single failing status line when the changeset
//! was rolled back.

use super::classify::transient_signature;
use crate::domain::{RecordId, UpstreamError};
use serde_json::json;

const CRLF: &str = "\r\n";

/// Multipart body plus the content type that announces its boundary
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub content_type: String,
    pub body: String,
}

/// Build a changeset that PATCHes `field = value` on every account.
///
/// `If-Match: *` keeps the PATCH from creating accounts that no longer exist.
pub fn build_mark_processed(
    api_root: &str,
    ids: &[RecordId],
    field: &str,
    value: &str,
    boundary_id: &str,
) -> BatchRequest {
    let batch_boundary = format!("batch_{boundary_id}");
    let changeset_boundary = format!("changeset_{boundary_id}");
    let payload = json!({ field: value }).to_string();

    let mut body = String::new();
    body.push_str(&format!("--{batch_boundary}{CRLF}"));
    body.push_str(&format!(
        "Content-Type: multipart/mixed; boundary={changeset_boundary}{CRLF}{CRLF}"
    ));

    for (n, id) in ids.iter().enumerate() {
        body.push_str(&format!("--{changeset_boundary}{CRLF}"));
        body.push_str(&format!("Content-Type: application/http{CRLF}"));
        body.push_str(&format!("Content-Transfer-Encoding: binary{CRLF}"));
        body.push_str(&format!("Content-ID: {}{CRLF}{CRLF}", n + 1));
        body.push_str(&format!("PATCH {api_root}/accounts({id}) HTTP/1.1{CRLF}"));
        body.push_str(&format!("Content-Type: application/json{CRLF}"));
        body.push_str(&format!("If-Match: *{CRLF}{CRLF}"));
        body.push_str(&payload);
        body.push_str(CRLF);
    }

    body.push_str(&format!("--{changeset_boundary}--{CRLF}{CRLF}"));
    body.push_str(&format!("--{batch_boundary}--{CRLF}"));

    BatchRequest {
        content_type: format!("multipart/mixed; boundary={batch_boundary}"),
        body,
    }
}

/// Check every operation status in a `$batch` response.
///
/// Succeeds only when at least `expected` status lines are present and all
/// of them are 2xx. A failing part carrying a rate-limit signature is
/// reported as transient so the batch can be retried.
pub fn inspect_response(body: &str, expected: usize) -> Result<(), UpstreamError> {
    let mut statuses = 0usize;

    for (line_no, line) in body.lines().enumerate() {
        let Some(rest) = line.trim().strip_prefix("HTTP/1.1 ") else {
            continue;
        };
        statuses += 1;

        let code: u16 = rest
            .split_whitespace()
            .next()
            .and_then(|c| c.parse().ok())
            .ok_or_else(|| {
                UpstreamError::InvalidResponse(format!(
                    "Malformed status line in $batch response: {line}"
                ))
            })?;

        if (200..300).contains(&code) {
            continue;
        }

        let detail: String = body
            .lines()
            .skip(line_no)
            .take(12)
            .collect::<Vec<_>>()
            .join(" ");

        if code == 429 || code == 503 {
            return Err(UpstreamError::Transient {
                signature: code.to_string(),
                message: format!("write-back operation rejected: {detail}"),
            });
        }
        if let Some(signature) = transient_signature(&detail) {
            return Err(UpstreamError::Transient {
                signature,
                message: format!("write-back operation rejected: {detail}"),
            });
        }
        return Err(UpstreamError::WriteBackRejected(format!(
            "operation returned {code}: {detail}"
        )));
    }

    if statuses < expected {
        return Err(UpstreamError::InvalidResponse(format!(
            "$batch response carried {statuses} operation statuses, expected {expected}"
        )));
    }

    Ok(())
}

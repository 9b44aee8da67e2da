use serde::Deserialize;

use crate::error::AppError;

/// Error body returned by the Divemap API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Turn a non-success HTTP status and its body into an `AppError`.
pub fn error_from_status(status: u16, body: &str, context: &str) -> AppError {
    let message = match extract_detail(body) {
        Some(detail) => format!("{context}: {detail}"),
        None => format!("{context}: HTTP {status}"),
    };

    match status {
        400 | 422 => AppError::BadRequest(message),
        401 => AppError::Auth(message),
        403 => AppError::Forbidden(message),
        404 => AppError::NotFound(message),
        _ => AppError::Network(message),
    }
}

/// Pull a readable message out of a `{"detail": ...}` body.
///
/// `detail` is either a string or a list of validation errors carrying `msg`.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

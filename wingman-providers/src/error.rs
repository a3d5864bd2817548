use serde_json::Value;
use wingman_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        CoreError::UpstreamError(err.to_string())
    }
}

/// Pull a readable message out of a provider error document.
///
/// Amadeus answers `{"errors": [{"title", "detail"}]}`, Google APIs answer
/// `{"error": {"message"}}`. Anything else is returned truncated.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(first) = value["errors"].as_array().and_then(|errors| errors.first()) {
            let title = first["title"].as_str().unwrap_or_default();
            let detail = first["detail"].as_str().unwrap_or_default();
            return match (title.is_empty(), detail.is_empty()) {
                (false, false) => format!("{}: {}", title, detail),
                (false, true) => title.to_string(),
                _ => detail.to_string(),
            };
        }
        if let Some(message) = value["error"]["message"].as_str() {
            return message.to_string();
        }
    }
    body.chars().take(200).collect()
}

/// Check the status and decode the JSON body of a provider response.
pub(crate) async fn read_json<T>(response: reqwest::Response) -> Result<T, ProviderError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amadeus_error_document() {
        let body = r#"{"errors":[{"status":400,"code":477,"title":"INVALID FORMAT","detail":"departureDate must be in the future"}]}"#;
        assert_eq!(error_message(body), "INVALID FORMAT: departureDate must be in the future");
    }

    #[test]
    fn test_google_error_document() {
        let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "API key not valid");
    }

    #[test]
    fn test_plain_body_is_truncated() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).len(), 200);
    }

    #[test]
    fn test_converts_to_upstream_error() {
        let err: CoreError = ProviderError::Api { status: 500, message: "boom".to_string() }.into();
        assert!(matches!(err, CoreError::UpstreamError(ref m) if m.contains("boom")));
    }
}

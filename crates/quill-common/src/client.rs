//! HTTP client for the checking service.

use quill_editor_core::{CheckRequest, CheckResult, MAX_TEXT_CHARS};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::QuillConfig;
use crate::error::CheckError;

/// Talks to one check endpoint. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CheckClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl CheckClient {
    pub fn new(endpoint: &str) -> Result<Self, CheckError> {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Result<Self, CheckError> {
        Ok(Self {
            client,
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    /// Build a client from config, applying the request timeout where the
    /// platform supports one.
    pub fn from_config(config: &QuillConfig) -> Result<Self, CheckError> {
        #[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        #[cfg(all(target_family = "wasm", target_os = "unknown"))]
        let client = reqwest::Client::new();

        Self::with_client(client, &config.endpoint)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The HTTP request `check` would send: a form POST of `text`, `mode`
    /// and, unless auto-detecting, `lang`.
    pub fn build_request(&self, request: &CheckRequest) -> Result<reqwest::Request, CheckError> {
        let chars = request.char_len();
        if chars > MAX_TEXT_CHARS {
            return Err(CheckError::TooLong {
                chars,
                max: MAX_TEXT_CHARS,
            });
        }
        Ok(self
            .client
            .post(self.endpoint.clone())
            .form(&request.form_fields())
            .build()?)
    }

    /// Send one check and parse the response.
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckResult, CheckError> {
        let http_request = self.build_request(request)?;
        tracing::debug!(
            target: "quill::check",
            endpoint = %self.endpoint,
            chars = request.char_len(),
            mode = %request.mode,
            lang = request.lang.as_deref().unwrap_or("auto"),
            "sending check"
        );

        let response = self.client.execute(http_request).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(service_error(status, &body));
        }

        let result: CheckResult = serde_json::from_str(&body)?;
        tracing::debug!(
            target: "quill::check",
            tokens = result.tokens.len(),
            lang = result.detected_lang.as_deref().unwrap_or("und"),
            "check response"
        );
        Ok(result)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, CheckError> {
    match Url::parse(endpoint.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(CheckError::InvalidEndpoint(endpoint.to_owned())),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    description: Option<String>,
}

/// Turn a failed response into an error, using the service's own message
/// where it sent one.
fn service_error(status: StatusCode, body: &str) -> CheckError {
    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.description));
    let message = from_json
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty() && !text.starts_with('<')).then(|| text.chars().take(200).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());
    CheckError::Service {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use quill_editor_core::CheckMode;

    use super::*;

    fn client() -> CheckClient {
        CheckClient::new("http://127.0.0.1:5000/check").unwrap()
    }

    #[test]
    fn test_request_is_form_post() {
        let req = CheckRequest::new("Ths is a tst.", CheckMode::Balanced, "und").unwrap();
        let http = client().build_request(&req).unwrap();
        assert_eq!(http.method(), reqwest::Method::POST);
        assert_eq!(http.url().as_str(), "http://127.0.0.1:5000/check");
        assert_eq!(
            http.headers()[reqwest::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = http.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"text=Ths+is+a+tst.&mode=balanced");
    }

    #[test]
    fn test_lang_hint_included() {
        let req = CheckRequest::new("Hallo", CheckMode::Fast, "de").unwrap();
        let http = client().build_request(&req).unwrap();
        let body = http.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"text=Hallo&mode=fast&lang=de");
    }

    #[test]
    fn test_too_long_rejected_locally() {
        let req = CheckRequest::new("a".repeat(MAX_TEXT_CHARS + 1), CheckMode::Fast, "und").unwrap();
        let err = client().build_request(&req).unwrap_err();
        assert!(matches!(err, CheckError::TooLong { chars: 10_001, .. }));
    }

    #[test]
    fn test_invalid_endpoints() {
        for endpoint in ["", "not a url", "ftp://example.com/check", "/check"] {
            assert!(
                matches!(CheckClient::new(endpoint), Err(CheckError::InvalidEndpoint(_))),
                "{endpoint}"
            );
        }
    }

    #[test]
    fn test_service_error_messages() {
        let err = service_error(StatusCode::BAD_REQUEST, r#"{"error": "No text provided"}"#);
        insta::assert_snapshot!(err.to_string(), @"checking service answered 400: No text provided");

        let err = service_error(StatusCode::PAYLOAD_TOO_LARGE, "<!doctype html><title>413</title>");
        assert!(matches!(&err, CheckError::Service { status: 413, message } if !message.contains('<')));
        assert!(!err.is_transient());

        let err = service_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(&err, CheckError::Service { message, .. } if message == "upstream down"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        let config = QuillConfig {
            // Port 9 (discard) is closed on any sane test machine.
            endpoint: "http://127.0.0.1:9/check".into(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let client = CheckClient::from_config(&config).unwrap();
        let req = CheckRequest::new("Ths", CheckMode::Fast, "und").unwrap();
        let err = client.check(&req).await.unwrap_err();
        assert!(matches!(err, CheckError::Http(_)));
        assert!(err.is_transient());
    }
}

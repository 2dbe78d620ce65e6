//! Optical Character Recognition (OCR)
//!
//! Client for the Azure Document Intelligence "analyze" operation. A document
//! URL is submitted to a prebuilt model, then the returned `Operation-Location`
//! is polled until the analysis reaches a terminal state.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use docintel_core::{DocumentAnalyzer, Line, OcrResult, Page, ReviewError, Word};
use docintel_logging::redact_sensitive_data;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

/// Model that extracts printed and handwritten text only.
pub const PREBUILT_READ: &str = "prebuilt-read";
pub const API_VERSION: &str = "2023-07-31";

const SERVICE: &str = "azure-di";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "operation-location";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Azure Document Intelligence analyzer.
pub struct AzureDocumentAnalyzer {
    client: Client,
    endpoint: String,
    api_key: String,
    model_id: String,
    api_version: String,
    poll_interval: Duration,
}

impl AzureDocumentAnalyzer {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model_id: PREBUILT_READ.to_string(),
            api_version: API_VERSION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Delay between polls when the service sends no usable `Retry-After`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.model_id,
            self.api_version
        )
    }

    /// Submit the document and return the operation URL to poll.
    async fn begin_analysis(&self, document_url: &str) -> Result<String> {
        let url = self.analyze_url();
        debug!(model = %self.model_id, url = %url, "Submitting document for analysis");

        let response = self
            .client
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&serde_json::json!({ "urlSource": document_url }))
            .send()
            .await
            .map_err(|e| ReviewError::service(SERVICE, format!("analyze request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::service(
                SERVICE,
                format!("analyze returned {}: {}", status, redact_sensitive_data(&body)),
            )
            .into());
        }

        let location = response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ReviewError::service(SERVICE, "analyze response has no Operation-Location header")
            })?;
        Ok(location.to_string())
    }

    /// Poll the operation until it succeeds, fails, or is canceled.
    async fn poll_until_done(&self, operation_url: &str) -> Result<OcrResult> {
        let mut polls = 0u32;
        loop {
            polls += 1;
            let response = self
                .client
                .get(operation_url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                .send()
                .await
                .map_err(|e| ReviewError::service(SERVICE, format!("poll request failed: {e}")))?;

            let status = response.status();
            let delay = poll_delay(response.headers(), self.poll_interval);
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(ReviewError::service(
                    SERVICE,
                    format!("poll returned {}: {}", status, redact_sensitive_data(&body)),
                )
                .into());
            }

            match decode_operation(&body)? {
                Some(result) => {
                    debug!(polls, "Analysis finished");
                    return Ok(result);
                }
                None => {
                    debug!(polls, delay_ms = delay.as_millis() as u64, "Analysis still running");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentAnalyzer {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn analyze(&self, document_url: &str) -> Result<OcrResult> {
        info!(model = %self.model_id, document = %document_url, "Sending document image to Azure DI");
        let operation_url = self.begin_analysis(document_url).await?;
        let result = self.poll_until_done(&operation_url).await?;
        info!(pages = result.pages.len(), "Received OCR result");
        Ok(result)
    }
}

/// `Retry-After` in whole seconds, or the fallback interval when it is
/// absent, not a number of seconds, or zero.
fn poll_delay(headers: &HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: OperationStatus,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<WirePage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    page_number: u32,
    #[serde(default)]
    lines: Vec<WireLine>,
    #[serde(default)]
    words: Vec<WireWord>,
}

#[derive(Debug, Deserialize)]
struct WireLine {
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireWord {
    content: String,
    confidence: f64,
}

impl From<WirePage> for Page {
    fn from(page: WirePage) -> Self {
        Page {
            page_number: page.page_number,
            lines: page
                .lines
                .into_iter()
                .map(|l| Line { content: l.content })
                .collect(),
            words: page
                .words
                .into_iter()
                .map(|w| Word {
                    content: w.content,
                    confidence: w.confidence,
                })
                .collect(),
        }
    }
}

/// Decode one poll response. `Ok(None)` means the analysis is still running.
fn decode_operation(body: &str) -> Result<Option<OcrResult>> {
    let operation: AnalyzeOperation = serde_json::from_str(body).map_err(|e| {
        ReviewError::service(SERVICE, format!("unreadable analyze operation: {e}"))
    })?;

    match operation.status {
        OperationStatus::NotStarted | OperationStatus::Running => Ok(None),
        OperationStatus::Succeeded => {
            let result = operation.analyze_result.ok_or_else(|| {
                ReviewError::service(SERVICE, "operation succeeded without an analyzeResult")
            })?;
            Ok(Some(OcrResult::new(
                result.pages.into_iter().map(Page::from).collect(),
            )))
        }
        OperationStatus::Failed | OperationStatus::Canceled => {
            let detail = operation
                .error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| "no error details".to_string());
            Err(ReviewError::service(
                SERVICE,
                format!("analysis {:?}: {}", operation.status, detail),
            )
            .into())
        }
        OperationStatus::Unknown => Err(ReviewError::service(
            SERVICE,
            "analyze operation reported an unknown status",
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    #[test]
    fn builds_analyze_url_without_double_slash() {
        let analyzer = AzureDocumentAnalyzer::new("https://res.cognitiveservices.azure.com/", "k");
        assert_eq!(
            analyzer.analyze_url(),
            "https://res.cognitiveservices.azure.com/formrecognizer/documentModels/prebuilt-read:analyze?api-version=2023-07-31"
        );
    }

    #[test]
    fn running_operation_is_not_done() {
        let body = json!({ "status": "running", "createdDateTime": "2024-02-01T00:00:00Z" });
        assert!(decode_operation(&body.to_string()).unwrap().is_none());

        let body = json!({ "status": "notStarted" });
        assert!(decode_operation(&body.to_string()).unwrap().is_none());
    }

    #[test]
    fn decodes_succeeded_operation() {
        let body = json!({
            "status": "succeeded",
            "analyzeResult": {
                "apiVersion": "2023-07-31",
                "modelId": "prebuilt-read",
                "content": "Hello\nWorld",
                "pages": [
                    {
                        "pageNumber": 1,
                        "width": 8.5,
                        "height": 11,
                        "unit": "inch",
                        "lines": [
                            { "content": "Hello", "polygon": [] },
                            { "content": "World", "polygon": [] }
                        ],
                        "words": [
                            { "content": "Hello", "confidence": 0.9, "span": { "offset": 0, "length": 5 } },
                            { "content": "World", "confidence": 0.8, "span": { "offset": 6, "length": 5 } }
                        ]
                    },
                    { "pageNumber": 2 }
                ]
            }
        });

        let result = decode_operation(&body.to_string()).unwrap().unwrap();
        assert_eq!(result.pages.len(), 2);
        let first = &result.pages[0];
        assert_eq!(first.page_number, 1);
        assert_eq!(first.lines[1].content, "World");
        assert_eq!(first.words[0].confidence, 0.9);
        assert!(result.pages[1].lines.is_empty());
        assert!(result.pages[1].words.is_empty());
    }

    #[test]
    fn failed_operation_surfaces_service_error() {
        let body = json!({
            "status": "failed",
            "error": { "code": "InvalidRequest", "message": "Could not download the file from the given URL." }
        });
        let err = decode_operation(&body.to_string()).unwrap_err();
        let review = err.downcast_ref::<ReviewError>().unwrap();
        assert!(matches!(review, ReviewError::Service { .. }));
        assert!(err.to_string().contains("Could not download"));
    }

    #[test]
    fn succeeded_without_result_is_an_error() {
        let body = json!({ "status": "succeeded" });
        assert!(decode_operation(&body.to_string()).is_err());
    }

    #[test]
    fn unknown_status_is_an_error() {
        let body = json!({ "status": "paused" });
        assert!(decode_operation(&body.to_string()).is_err());
    }

    #[test]
    fn garbage_body_is_a_service_error() {
        let err = decode_operation("<html>gateway timeout</html>").unwrap_err();
        assert!(err.downcast_ref::<ReviewError>().is_some());
    }

    #[test]
    fn poll_delay_prefers_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(poll_delay(&headers, Duration::from_millis(250)), Duration::from_millis(250));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(poll_delay(&headers, Duration::from_millis(250)), Duration::from_secs(2));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(poll_delay(&headers, Duration::from_millis(250)), Duration::from_millis(250));
    }

    #[test]
    fn zero_retry_after_uses_poll_interval() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("0"));
        assert_eq!(poll_delay(&headers, Duration::from_millis(250)), Duration::from_millis(250));
    }

    /// Minimal HTTP/1.1 server answering one canned response per connection,
    /// in order. Returns the raw requests it received.
    fn serve(listener: TcpListener, responses: Vec<String>) -> JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
            requests
        })
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let body_len = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut out = format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n",
            body.len()
        );
        for (name, value) in headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str("\r\n");
        out.push_str(body);
        out
    }

    async fn fake_service() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    #[tokio::test]
    async fn analyze_polls_until_succeeded() {
        let (listener, base) = fake_service().await;
        let operation = format!("{base}/formrecognizer/documentModels/prebuilt-read/analyzeResults/op-1");
        let succeeded = json!({
            "status": "succeeded",
            "analyzeResult": {
                "pages": [{
                    "pageNumber": 1,
                    "lines": [{ "content": "Hello" }],
                    "words": [{ "content": "Hello", "confidence": 0.97 }]
                }]
            }
        });
        let server = serve(
            listener,
            vec![
                http_response("202 Accepted", &[("Operation-Location", &operation)], ""),
                http_response("200 OK", &[("Retry-After", "0")], r#"{"status":"running"}"#),
                http_response("200 OK", &[], &succeeded.to_string()),
            ],
        );

        let analyzer = AzureDocumentAnalyzer::new(format!("{base}/"), "test-key")
            .with_poll_interval(Duration::from_millis(10));
        let result = analyzer.analyze("https://example.com/scan.jpg").await.unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].words.len(), 1);
        assert_eq!(result.pages[0].lines[0].content, "Hello");

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].starts_with(
            "POST /formrecognizer/documentModels/prebuilt-read:analyze?api-version=2023-07-31 "
        ));
        assert!(requests[0].to_lowercase().contains("ocp-apim-subscription-key: test-key"));
        assert!(requests[0].contains(r#"{"urlSource":"https://example.com/scan.jpg"}"#));
        assert!(requests[1].starts_with("GET /formrecognizer/documentModels/prebuilt-read/analyzeResults/op-1 "));
        assert!(requests[2].to_lowercase().contains("ocp-apim-subscription-key: test-key"));
    }

    #[tokio::test]
    async fn accepted_without_operation_location_is_service_error() {
        let (listener, base) = fake_service().await;
        let server = serve(listener, vec![http_response("202 Accepted", &[], "")]);

        let analyzer = AzureDocumentAnalyzer::new(base, "test-key");
        let err = analyzer.analyze("https://example.com/scan.jpg").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::Service { .. })
        ));
        assert!(err.to_string().contains("Operation-Location"));
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_submit_is_service_error() {
        let (listener, base) = fake_service().await;
        let body = r#"{"error":{"code":"401","message":"Access denied due to invalid subscription key."}}"#;
        let server = serve(listener, vec![http_response("401 Unauthorized", &[], body)]);

        let analyzer = AzureDocumentAnalyzer::new(base, "test-key");
        let err = analyzer.analyze("https://example.com/scan.jpg").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::Service { .. })
        ));
        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("invalid subscription key"));
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_poll_status_is_service_error() {
        let (listener, base) = fake_service().await;
        let operation = format!("{base}/operations/op-2");
        let failed = r#"{"status":"failed","error":{"code":"InvalidContent","message":"The file is corrupted."}}"#;
        let server = serve(
            listener,
            vec![
                http_response("202 Accepted", &[("Operation-Location", &operation)], ""),
                http_response("200 OK", &[], failed),
            ],
        );

        let analyzer = AzureDocumentAnalyzer::new(base, "test-key");
        let err = analyzer.analyze("https://example.com/scan.jpg").await.unwrap_err();

        assert!(err.to_string().contains("The file is corrupted."));
        assert_eq!(server.await.unwrap().len(), 2);
    }
}

//! Streaming agent client.

use bytes::Bytes;
use cortex_agent_core::{CortexResponse, Summary};
use cortex_agent_streaming::{
    LineOutcome, LineStream, Preview, ProgressNotifier, ResponseAggregator, DATA_PREFIX,
};
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::progress::ProgressSink;
use crate::request::AgentRequest;

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";

/// Latest preview produced by the stream; `None` until the first update.
type ProgressTx = watch::Sender<Option<Preview>>;

/// Client for one agent endpoint.
///
/// Every [`ask`](Self::ask) owns its own aggregator, so one client can serve
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct CortexClient {
    http: Client,
    config: ClientConfig,
    notifier: ProgressNotifier,
}

impl CortexClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let notifier = ProgressNotifier::new(config.preview.clone());
        Self {
            http: Client::new(),
            config,
            notifier,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ask a question and summarize the answer.
    ///
    /// Never fails: errors come back as an error-shaped [`Summary`].
    pub async fn ask(&self, query: &str) -> Summary {
        self.ask_with_progress(query, &()).await
    }

    /// Like [`ask`](Self::ask), publishing progress previews to `sink`.
    pub async fn ask_with_progress<P>(&self, query: &str, sink: &P) -> Summary
    where
        P: ProgressSink + ?Sized,
    {
        match self.try_ask(query, sink).await {
            Ok(summary) => summary,
            Err(e) => {
                match &e {
                    ClientError::Http { status, body } => {
                        error!(status, body = %body, "Agent request rejected");
                    }
                    other => error!(error = %other, "Agent request failed"),
                }
                e.to_summary()
            }
        }
    }

    /// Ask a question, surfacing failures as [`ClientError`].
    ///
    /// The deadline covers sending the request and consuming the whole stream;
    /// partial results are discarded when it expires. Progress is delivered
    /// alongside the stream and never counts against the deadline: a slow
    /// sink only sees fewer, more recent previews.
    pub async fn try_ask<P>(&self, query: &str, sink: &P) -> ClientResult<Summary>
    where
        P: ProgressSink + ?Sized,
    {
        let (progress, updates) = watch::channel(None);
        let timeout = self.config.timeout;

        let request = async move {
            let outcome = tokio::time::timeout(timeout, self.run(query, &progress)).await;
            drop(progress);
            outcome.unwrap_or_else(|_| Err(ClientError::Timeout(timeout)))
        };

        let (result, ()) = tokio::join!(request, self.forward(updates, sink));
        result
    }

    async fn run(&self, query: &str, progress: &ProgressTx) -> ClientResult<Summary> {
        info!(url = %self.config.agent_url, "Sending agent request");

        let response = self
            .http
            .post(self.config.agent_url.clone())
            .header(TOKEN_TYPE_HEADER, self.config.token_type.header_value())
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&AgentRequest::user(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status.as_u16(), body));
        }

        self.consume(response.bytes_stream().map_err(ClientError::from), progress)
            .await
    }

    /// Aggregate a response body, falling back to plain JSON when it carries
    /// no data lines.
    async fn consume<S>(&self, body: S, progress: &ProgressTx) -> ClientResult<Summary>
    where
        S: Stream<Item = ClientResult<Bytes>>,
    {
        let mut lines = Box::pin(LineStream::new(body));
        let mut aggregator = ResponseAggregator::new();
        let mut saw_data = false;
        let mut plain_body = String::new();

        while let Some(line) = lines.next().await {
            let line = line?;

            if !saw_data {
                if line.starts_with(DATA_PREFIX) {
                    saw_data = true;
                    plain_body.clear();
                } else {
                    plain_body.push_str(&line);
                    plain_body.push('\n');
                }
            }

            match aggregator.ingest_line(&line) {
                LineOutcome::Ingested(change) if change.is_progress() => {
                    progress.send_replace(Some(self.notifier.preview(aggregator.result())));
                }
                LineOutcome::Done => break,
                _ => {}
            }
        }

        if !saw_data && !plain_body.trim().is_empty() {
            debug!("No data lines; parsing body as JSON");
            let response = CortexResponse::from_json_str(&plain_body)?;
            return Ok(Summary::extract(&response));
        }

        let result = aggregator.result();
        info!(
            elapsed_ms = result.elapsed().num_milliseconds(),
            statuses = result.status_messages.len(),
            text_len = result.text.len(),
            "Agent request complete"
        );
        Ok(aggregator.summary())
    }

    /// Publish the latest preview until the stream side hangs up.
    ///
    /// Previews that arrive while a publish is in flight are coalesced, and
    /// each publish is bounded by the progress timeout. Failures are logged.
    async fn forward<P>(&self, mut updates: watch::Receiver<Option<Preview>>, sink: &P)
    where
        P: ProgressSink + ?Sized,
    {
        let limit = self.config.progress_timeout;
        while updates.changed().await.is_ok() {
            let latest = updates.borrow_and_update().clone();
            let Some(preview) = latest else {
                continue;
            };
            let rendered = preview.render(&self.notifier.config().header);
            match tokio::time::timeout(limit, sink.publish(&preview, &rendered)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Progress update failed"),
                Err(_) => warn!(
                    timeout_ms = limit.as_millis() as u64,
                    "Progress update timed out"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenType;
    use async_trait::async_trait;
    use cortex_agent_streaming::StreamError;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RUN_PATH: &str = "/api/v2/cortex/agent:run";

    fn client_for(server: &MockServer) -> CortexClient {
        let url = format!("{}{}", server.uri(), RUN_PATH);
        CortexClient::new(ClientConfig::new(&url, "test-token").unwrap())
    }

    fn sse(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
    }

    const STATUS_AND_TEXT: &str = "event: response.status\n\
        data: {\"message\":\"Searching tables\"}\n\
        \n\
        event: response.text.delta\n\
        data: {\"text\":\"Result: \"}\n\
        \n\
        data: {\"text\":\"42\"}\n\
        \n\
        data: [DONE]\n";

    #[tokio::test]
    async fn test_ask_streams_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(RUN_PATH))
            .and(header(TOKEN_TYPE_HEADER, "PROGRAMMATIC_ACCESS_TOKEN"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(json!({
                "messages": [{"role": "user", "content": [{"type": "text", "text": "What is it?"}]}],
                "tool_choice": {"type": "auto"},
                "stream": true
            })))
            .respond_with(sse(STATUS_AND_TEXT))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(&server).ask("What is it?").await;

        assert_eq!(summary.text, "Result: 42");
        assert!(summary.sql_queries.is_empty());
        assert!(summary.citations.is_empty());
        assert!(!summary.is_error());
    }

    #[tokio::test]
    async fn test_progress_previews() {
        let server = MockServer::start().await;
        let body = "event: response.status\n\
            data: {\"message\":\"Planning\"}\n\
            event: response.thinking.delta\n\
            data: {\"text\":\"Look\",\"content_index\":0}\n\
            data: {\"text\":\"ing up data\",\"content_index\":0}\n\
            event: response.text.delta\n\
            data: {\"text\":\"Done\"}\n\
            data: [DONE]\n";
        Mock::given(method("POST"))
            .respond_with(sse(body))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel::<Preview>();
        let summary = client_for(&server).ask_with_progress("q", &tx).await;
        drop(tx);

        let mut previews = Vec::new();
        while let Some(preview) = rx.recv().await {
            previews.push(preview);
        }

        assert_eq!(summary.text, "Done");
        assert_eq!(summary.planning_updates, vec!["Looking up data".to_string()]);
        assert!(!previews.is_empty() && previews.len() <= 3);
        let last = previews.last().unwrap();
        assert_eq!(last.status_lines, vec!["Planning".to_string()]);
        assert_eq!(last.thinking_excerpt.as_deref(), Some("Looking up data"));
    }

    #[tokio::test]
    async fn test_oauth_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header(TOKEN_TYPE_HEADER, "OAUTH"))
            .respond_with(sse(STATUS_AND_TEXT))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}{}", server.uri(), RUN_PATH);
        let config = ClientConfig::new(&url, "oauth-token")
            .unwrap()
            .with_token_type(TokenType::OAuth);
        let summary = CortexClient::new(config).ask("q").await;
        assert_eq!(summary.text, "Result: 42");
    }

    #[tokio::test]
    async fn test_timeout_returns_error_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse(STATUS_AND_TEXT).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let url = format!("{}{}", server.uri(), RUN_PATH);
        let config = ClientConfig::new(&url, "t")
            .unwrap()
            .with_timeout(Duration::from_secs(1));
        let summary = CortexClient::new(config).ask("q").await;

        assert_eq!(summary.text, "Error: Request took longer than 1 seconds");
        assert!(summary.sql_queries.is_empty());
        assert!(summary.citations.is_empty());
        assert!(summary.is_error());
    }

    #[tokio::test]
    async fn test_http_error_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let summary = client_for(&server).ask("q").await;
        assert_eq!(summary.text, "Error: Request error: HTTP 401 Unauthorized");
        assert!(summary.is_error());
    }

    #[tokio::test]
    async fn test_http_error_body_stays_out_of_summary() {
        let server = MockServer::start().await;
        let page = format!("<html><body>{}</body></html>", "oops ".repeat(1000));
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string(page))
            .mount(&server)
            .await;

        let summary = client_for(&server).ask("q").await;
        assert_eq!(summary.text, "Error: Request error: HTTP 500 Internal Server Error");
        assert!(!summary.text.contains("oops"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_unexpected_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"event: ping\nnot json at all\n".to_vec(), "text/plain"),
            )
            .mount(&server)
            .await;

        let summary = client_for(&server).ask("q").await;
        assert!(summary.text.starts_with("Error: Unexpected error:"));
        assert!(summary.is_error());
    }

    #[tokio::test]
    async fn test_data_lines_need_a_space() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse("data:{\"text\":\"hi\"}\n"))
            .mount(&server)
            .await;

        let summary = client_for(&server).ask("q").await;
        assert!(summary.text.starts_with("Error: Unexpected error:"));
    }

    #[tokio::test]
    async fn test_connection_reset_discards_partial_text() {
        let client = CortexClient::new(ClientConfig::new("http://localhost/run", "t").unwrap());
        let chunks: Vec<ClientResult<Bytes>> = vec![
            Ok(Bytes::from_static(
                b"event: response.text.delta\ndata: {\"text\":\"partial answer\"}\n",
            )),
            Err(StreamError::from(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))
            .into()),
        ];
        let (progress, _updates) = watch::channel(None);

        let err = client
            .consume(stream::iter(chunks), &progress)
            .await
            .unwrap_err();
        let summary = err.to_summary();

        assert!(summary.is_error());
        assert!(summary.text.contains("connection reset"));
        assert!(!summary.text.contains("partial answer"));
        assert!(summary.sql_queries.is_empty());
    }

    #[tokio::test]
    async fn test_json_body_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "req-1",
                "message": {"role": "assistant", "content": [
                    {"type": "text", "text": "Plain answer"},
                    {"type": "tool_results", "tool_results": {
                        "tool_use_id": "t1",
                        "content": [{"json": {"sql": "SELECT 1"}}]
                    }}
                ]},
                "suggestions": ["Next?"]
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server).ask("q").await;
        assert_eq!(summary.text, "Plain answer");
        assert_eq!(summary.sql_queries, vec!["SELECT 1".to_string()]);
        assert_eq!(summary.suggestions, vec!["Next?".to_string()]);
        assert_eq!(summary.request_id.as_deref(), Some("req-1"));
    }

    struct FailingSink;

    #[async_trait]
    impl ProgressSink for FailingSink {
        async fn publish(&self, _preview: &Preview, _rendered: &str) -> ClientResult<()> {
            Err(ClientError::Sink("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse(STATUS_AND_TEXT))
            .mount(&server)
            .await;

        let summary = client_for(&server)
            .ask_with_progress("q", &FailingSink)
            .await;
        assert_eq!(summary.text, "Result: 42");
        assert!(!summary.is_error());
    }

    struct SlowSink {
        delay: Duration,
        published: Mutex<Vec<String>>,
    }

    impl SlowSink {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                published: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProgressSink for SlowSink {
        async fn publish(&self, _preview: &Preview, rendered: &str) -> ClientResult<()> {
            tokio::time::sleep(self.delay).await;
            self.published.lock().unwrap().push(rendered.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_sink_does_not_spend_request_deadline() {
        let server = MockServer::start().await;
        let body = "event: response.status\n\
            data: {\"message\":\"Planning\"}\n\
            data: {\"message\":\"Running SQL\"}\n\
            event: response.text.delta\n\
            data: {\"text\":\"ok\"}\n\
            data: [DONE]\n";
        Mock::given(method("POST"))
            .respond_with(sse(body))
            .mount(&server)
            .await;

        let url = format!("{}{}", server.uri(), RUN_PATH);
        let config = ClientConfig::new(&url, "t")
            .unwrap()
            .with_timeout(Duration::from_secs(1));
        let sink = SlowSink::new(Duration::from_millis(800));

        let summary = CortexClient::new(config).ask_with_progress("q", &sink).await;

        assert_eq!(summary.text, "ok");
        assert!(!summary.is_error());
        let published = sink.published.lock().unwrap();
        assert!(published.last().unwrap().ends_with("• Running SQL"));
    }

    struct StuckSink;

    #[async_trait]
    impl ProgressSink for StuckSink {
        async fn publish(&self, _preview: &Preview, _rendered: &str) -> ClientResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stuck_sink_is_abandoned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse(STATUS_AND_TEXT))
            .mount(&server)
            .await;

        let url = format!("{}{}", server.uri(), RUN_PATH);
        let config = ClientConfig::new(&url, "t")
            .unwrap()
            .with_progress_timeout(Duration::from_millis(100));

        let summary = CortexClient::new(config)
            .ask_with_progress("q", &StuckSink)
            .await;
        assert_eq!(summary.text, "Result: 42");
    }
}

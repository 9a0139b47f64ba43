//! Progress sinks.
//!
//! A sink receives a fresh [`Preview`] whenever a status or thinking update
//! changes what the caller should display. Delivery is best-effort: a sink
//! error is logged by the client and never affects the request.

use async_trait::async_trait;
use cortex_agent_streaming::Preview;
use tokio::sync::mpsc;

use crate::error::{ClientError, ClientResult};

/// Receiver of live progress previews.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Publish one preview; `rendered` is the preview rendered under the
    /// configured header.
    async fn publish(&self, preview: &Preview, rendered: &str) -> ClientResult<()>;
}

/// Discards every update.
#[async_trait]
impl ProgressSink for () {
    async fn publish(&self, _preview: &Preview, _rendered: &str) -> ClientResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for mpsc::UnboundedSender<Preview> {
    async fn publish(&self, preview: &Preview, _rendered: &str) -> ClientResult<()> {
        self.send(preview.clone())
            .map_err(|_| ClientError::Sink("preview receiver dropped".to_string()))
    }
}

#[async_trait]
impl ProgressSink for mpsc::UnboundedSender<String> {
    async fn publish(&self, _preview: &Preview, rendered: &str) -> ClientResult<()> {
        self.send(rendered.to_string())
            .map_err(|_| ClientError::Sink("preview receiver dropped".to_string()))
    }
}

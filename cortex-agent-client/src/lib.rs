//! # cortex-agent-client
//!
//! HTTP client for the Cortex Agents API.
//!
//! [`CortexClient::ask`] sends one streaming request, feeds the response
//! through the [`cortex_agent_streaming`] pipeline under a hard deadline and
//! always returns a [`Summary`](cortex_agent_core::Summary). Failures come
//! back as error-shaped summaries; use [`CortexClient::try_ask`] to get the
//! [`ClientError`] instead.
//!
//! ## Example
//!
//! ```ignore
//! use cortex_agent_client::{ClientConfig, CortexClient};
//!
//! let config = ClientConfig::from_env()?;
//! let client = CortexClient::new(config);
//!
//! let summary = client.ask("What were sales last quarter?").await;
//! println!("{}", summary.text);
//! for sql in &summary.sql_queries {
//!     println!("SQL: {sql}");
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod progress;
pub mod request;

// Re-exports
pub use client::CortexClient;
pub use config::{ClientConfig, TokenType, DEFAULT_PROGRESS_TIMEOUT, DEFAULT_TIMEOUT};
pub use error::{ClientError, ClientResult};
pub use progress::ProgressSink;
pub use request::AgentRequest;

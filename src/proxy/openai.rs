//! OpenAI chat-completion provider
//!
//! Forwards request bodies to the configured chat-completion endpoint with
//! the server-held API key, bounded by a per-call timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    proxy::{
        headers::{build_default_headers, relay_content_type},
        logging::RequestContext,
        provider::{ChatProvider, UpstreamReply},
    },
    routes::metrics::record_upstream_duration,
};

/// OpenAI chat-completion client
pub struct OpenAIProvider {
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl OpenAIProvider {
    /// Create a new provider from configuration
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self::with_endpoint(
            client,
            config.upstream_url.clone(),
            SecretString::new(config.upstream_api_key.expose_secret().into()),
            config.upstream_timeout,
        )
    }

    /// Create a provider for an explicit endpoint
    pub fn with_endpoint(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            timeout,
        }
    }

    /// Upstream call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, body: Bytes) -> AppResult<Result<UpstreamReply, reqwest::Error>> {
        let headers = build_default_headers(self.api_key.expose_secret())?;

        let call = async {
            let response = self
                .client
                .post(&self.url)
                .headers(headers)
                .body(body)
                .send()
                .await?;

            let status = response.status();
            let content_type = relay_content_type(response.headers());
            let body = response.bytes().await?;

            Ok::<_, reqwest::Error>(UpstreamReply {
                status,
                content_type,
                body,
            })
        };

        // Covers connect, headers and the full body read
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AppError::UpstreamTimeout {
                timeout: self.timeout,
            })
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip_all, fields(trace_id = %ctx.trace_id, model = %ctx.model))]
    async fn relay(&self, body: Bytes, ctx: &RequestContext) -> AppResult<UpstreamReply> {
        ctx.log_upstream_request(&self.url, body.len());

        let started = Instant::now();
        let outcome = self.send(body).await;
        record_upstream_duration(started.elapsed());

        match outcome {
            Ok(Ok(reply)) => {
                ctx.log_upstream_response(reply.status.as_u16(), reply.body.len());
                if let Some(content) = first_choice_content(&reply.body) {
                    ctx.log_reply_preview(&content);
                }
                Ok(reply)
            }
            Ok(Err(e)) if e.is_timeout() => {
                ctx.log_timeout(self.timeout);
                Err(AppError::UpstreamTimeout {
                    timeout: self.timeout,
                })
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                ctx.log_connection_error(&message, &self.url);
                Err(AppError::Upstream(message))
            }
            Err(AppError::UpstreamTimeout { timeout }) => {
                ctx.log_timeout(timeout);
                Err(AppError::UpstreamTimeout { timeout })
            }
            Err(e) => {
                ctx.log_error(&e.to_string());
                Err(e)
            }
        }
    }
}

/// Extract `choices[0].message.content` from a chat-completion body
fn first_choice_content(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
        .map(str::to_string)
}

use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{parse_error_message, ApiError};
use crate::payload::{ChatCompletionRequest, CompletionRequest, CompletionsResponse};
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::url::{chat_completions_url, completions_url};

/// Optional cancellation signal shared across request loops.
///
/// This signal hard-aborts in-flight transport work. Tree-level interruption
/// is cooperative and handled by the builder, not here.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Capability object exposing the two discrete completion operations the
/// tree core requires. Implementations must keep exactly one request per
/// call in flight and return the parsed response envelope.
#[async_trait]
pub trait CompletionsClient: Send + Sync {
    async fn chat_complete(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError>;

    async fn complete(
        &self,
        request: &CompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError>;
}

/// reqwest-backed [`CompletionsClient`] with retry and cancellation-aware
/// awaiting.
#[derive(Debug)]
pub struct HttpCompletionsClient {
    http: Client,
    config: ApiConfig,
}

impl HttpCompletionsClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn build_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut out = HeaderMap::new();
        if !self.config.api_key.trim().is_empty() {
            let value = format!("Bearer {}", self.config.api_key.trim());
            out.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value)
                    .map_err(|_| ApiError::InvalidBaseUrl("invalid api key header".to_string()))?,
            );
        }
        if let Some(user_agent) = self.config.user_agent.as_deref() {
            out.insert(
                USER_AGENT,
                HeaderValue::from_str(user_agent).map_err(|_| {
                    ApiError::InvalidBaseUrl("invalid user agent header".to_string())
                })?,
            );
        }
        for (key, value) in &self.config.extra_headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ApiError::InvalidBaseUrl(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(value).map_err(|_| {
                    ApiError::InvalidBaseUrl(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    async fn post_with_retry<T: Serialize + ?Sized>(
        &self,
        url: String,
        payload: &T,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError> {
        let headers = self.build_headers()?;
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(ApiError::Cancelled);
            }

            let request = self.http.post(&url).headers(headers.clone()).json(payload);
            let response = await_or_cancel(request.send(), cancellation)
                .await?
                .map_err(ApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        let parsed = await_or_cancel(response.json::<CompletionsResponse>(), cancellation)
                            .await?
                            .map_err(ApiError::from)?;
                        return Ok(parsed);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_else(|_| {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(ApiError::Status(status, message));
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                    if attempt < MAX_RETRIES {
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                }
            }
        }

        Err(ApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }
}

#[async_trait]
impl CompletionsClient for HttpCompletionsClient {
    async fn chat_complete(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError> {
        let url = chat_completions_url(&self.config.base_url);
        self.post_with_retry(url, request, cancellation).await
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError> {
        let url = completions_url(&self.config.base_url);
        self.post_with_retry(url, request, cancellation).await
    }
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(ApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(ApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Murmur backend API.
//!
//! Provides [`HttpBackend`] which handles URL construction, bearer
//! authentication, status mapping, streamed reply bodies, and retry of
//! idempotent reads on transient errors.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use murmur_config::model::ApiConfig;
use murmur_core::types::{
    ConversationRecord, Escalation, HistoryMessage, KnowledgeDraft, KnowledgeReceipt, SimpleReply,
};
use murmur_core::{
    AgentId, Backend, ByteStream, ConversationCategory, ConversationId, EscalationId, Layer,
    MurmurError,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::CredentialManager;
use crate::endpoints::{MarkAnsweredBody, SimpleBody, StartChatBody, StreamBody};

/// How a request may be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    /// Idempotent read: timed out, retried on transient statuses.
    Read,
    /// State-changing call: timed out, never retried.
    Write,
    /// Streamed reply: no client timeout, never retried.
    Stream,
}

/// [`Backend`] over the Murmur HTTP API.
///
/// Every request carries `Authorization: Bearer <token>` from the
/// [`CredentialManager`]. A non-2xx status becomes [`MurmurError::Http`]
/// with the response body as detail; a 401 also drops the cached credential.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    credentials: CredentialManager,
    request_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpBackend {
    pub fn new(api: &ApiConfig, credentials: CredentialManager) -> Result<Self, MurmurError> {
        let base_url = Url::parse(&api.base_url)
            .map_err(|e| MurmurError::Config(format!("invalid api.base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MurmurError::Config(format!(
                "api.base_url cannot be a base URL: {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("murmur/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MurmurError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            request_timeout: Duration::from_secs(api.request_timeout_secs),
            max_retries: api.max_retries,
            retry_delay: Duration::from_millis(api.retry_delay_ms),
        })
    }

    /// The credential manager, for session teardown.
    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, MurmurError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MurmurError::Config(format!("cannot append a path to {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request, retrying idempotent reads on 429/500/503.
    async fn execute<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        dispatch: Dispatch,
    ) -> Result<Response, MurmurError>
    where
        B: Serialize + ?Sized,
    {
        let retries = if dispatch == Dispatch::Read {
            self.max_retries
        } else {
            0
        };
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, %url, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let credential = self.credentials.bearer().await?;
            let mut request: RequestBuilder = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(credential.expose());
            if dispatch != Dispatch::Stream {
                request = request.timeout(self.request_timeout);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| MurmurError::transport(format!("{method} {} failed", url.path()), e))?;
            let status = response.status();
            debug!(%method, path = url.path(), %status, attempt, "response received");

            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::UNAUTHORIZED {
                self.credentials.invalidate().await;
            }

            let detail = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < retries {
                warn!(%status, body = %detail, "transient error, will retry");
                attempt += 1;
                continue;
            }
            return Err(MurmurError::Http {
                status: status.as_u16(),
                detail,
            });
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, MurmurError> {
        let response = self
            .execute::<()>(Method::GET, url, None, Dispatch::Read)
            .await?;
        read_json(response).await
    }

    async fn post<B, T>(&self, url: Url, body: Option<&B>) -> Result<T, MurmurError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let response = self.execute(Method::POST, url, body, Dispatch::Write).await?;
        read_json_or_default(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, MurmurError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| MurmurError::transport("failed to read response body", e))?;
    serde_json::from_slice(&body).map_err(|e| MurmurError::decode("failed to parse response", e))
}

/// Like [`read_json`], but an empty body yields `T::default()`.
async fn read_json_or_default<T: DeserializeOwned + Default>(
    response: Response,
) -> Result<T, MurmurError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| MurmurError::transport("failed to read response body", e))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&body).map_err(|e| MurmurError::decode("failed to parse response", e))
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_conversations(
        &self,
        category: ConversationCategory,
    ) -> Result<Vec<ConversationRecord>, MurmurError> {
        let mut url = self.endpoint(&["conversations"])?;
        url.query_pairs_mut()
            .append_pair("category", &category.to_string());
        self.get_json(url).await
    }

    async fn start_chat(&self, agent_id: &AgentId) -> Result<ConversationRecord, MurmurError> {
        let url = self.endpoint(&["conversations"])?;
        let response = self
            .execute(
                Method::POST,
                url,
                Some(&StartChatBody { agent_id }),
                Dispatch::Write,
            )
            .await?;
        read_json(response).await
    }

    async fn load_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<HistoryMessage>, MurmurError> {
        let url = self.endpoint(&["conversations", conversation_id.as_str(), "messages"])?;
        // A null body means an empty history.
        let history: Option<Vec<HistoryMessage>> = self.get_json(url).await?;
        Ok(history.unwrap_or_default())
    }

    async fn send_streaming(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<ByteStream, MurmurError> {
        let url = self.endpoint(&["chat", "stream"])?;
        let body = StreamBody {
            conversation_id,
            message: content,
        };
        let response = self
            .execute(Method::POST, url, Some(&body), Dispatch::Stream)
            .await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| MurmurError::transport("reply stream interrupted", e));
        Ok(Box::pin(stream))
    }

    async fn send_simple(
        &self,
        agent_id: &AgentId,
        content: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<SimpleReply, MurmurError> {
        let url = self.endpoint(&["chat"])?;
        let body = SimpleBody {
            agent_id,
            message: content,
            conversation_id,
        };
        let response = self
            .execute(Method::POST, url, Some(&body), Dispatch::Write)
            .await?;
        read_json(response).await
    }

    async fn list_escalations(&self) -> Result<Vec<Escalation>, MurmurError> {
        let url = self.endpoint(&["escalations"])?;
        self.get_json(url).await
    }

    async fn mark_escalation_answered(
        &self,
        escalation_id: &EscalationId,
        answer: &str,
        layer: Layer,
    ) -> Result<(), MurmurError> {
        let url = self.endpoint(&["escalations", escalation_id.as_str(), "mark-answered"])?;
        let _: serde_json::Value = self
            .post(url, Some(&MarkAnsweredBody { answer, layer }))
            .await?;
        Ok(())
    }

    async fn decline_escalation(&self, escalation_id: &EscalationId) -> Result<(), MurmurError> {
        let url = self.endpoint(&["escalations", escalation_id.as_str(), "decline"])?;
        let _: serde_json::Value = self.post::<(), _>(url, None).await?;
        Ok(())
    }

    async fn publish_knowledge(
        &self,
        draft: &KnowledgeDraft,
    ) -> Result<KnowledgeReceipt, MurmurError> {
        let url = self.endpoint(&["agents", draft.agent_id.as_str(), "knowledge"])?;
        self.post(url, Some(draft)).await
    }

    async fn end_session(&self) {
        self.credentials.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use murmur_test_utils::StaticCredentials;

    fn backend(base_url: &str) -> HttpBackend {
        let api = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        let credentials =
            CredentialManager::new(Arc::new(StaticCredentials::token("t")), chrono::Duration::zero());
        HttpBackend::new(&api, credentials).unwrap()
    }

    #[test]
    fn endpoint_appends_and_escapes_segments() {
        let base = backend("http://localhost:8000/api");
        let url = base
            .endpoint(&["conversations", "a b/c", "messages"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/conversations/a%20b%2Fc/messages"
        );

        let trailing = backend("http://localhost:8000/api/");
        assert_eq!(
            trailing.endpoint(&["chat"]).unwrap().as_str(),
            "http://localhost:8000/api/chat"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let api = ApiConfig {
            base_url: "mailto:owner@example.com".into(),
            ..ApiConfig::default()
        };
        let credentials =
            CredentialManager::new(Arc::new(StaticCredentials::token("t")), chrono::Duration::zero());
        assert!(matches!(
            HttpBackend::new(&api, credentials),
            Err(MurmurError::Config(_))
        ));
    }

    #[test]
    fn transient_statuses() {
        for code in [429, 500, 503] {
            assert!(is_transient_error(StatusCode::from_u16(code).unwrap()));
        }
        for code in [400, 401, 404, 502] {
            assert!(!is_transient_error(StatusCode::from_u16(code).unwrap()));
        }
    }
}

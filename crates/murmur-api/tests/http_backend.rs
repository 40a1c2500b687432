// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HttpBackend against a wiremock server.

use std::sync::Arc;

use futures::StreamExt;
use murmur_api::{CredentialManager, HttpBackend};
use murmur_config::model::ApiConfig;
use murmur_core::types::KnowledgeDraft;
use murmur_core::{
    AgentId, Backend, ConversationCategory, ConversationId, ErrorKind, EscalationId, Layer,
    MurmurError, Role,
};
use murmur_stream::{StreamEvent, decode_stream};
use murmur_test_utils::StaticCredentials;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_with(server: &MockServer, credentials: StaticCredentials) -> HttpBackend {
    let api = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        retry_delay_ms: 10,
        ..ApiConfig::default()
    };
    let manager = CredentialManager::new(Arc::new(credentials), chrono::Duration::zero());
    HttpBackend::new(&api, manager).unwrap()
}

fn backend(server: &MockServer) -> HttpBackend {
    backend_with(server, StaticCredentials::token("secret-token"))
}

#[tokio::test]
async fn list_conversations_sends_category_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .and(query_param("category", "direct_chat"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "c1",
                "category": "direct_chat",
                "counterpart": {"kind": "agent", "id": "a1", "name": "Chef Remy", "handle": "remy"},
                "last_message_preview": "Bon appetit",
                "unread_count": 2
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = backend(&server)
        .list_conversations(ConversationCategory::DirectChat)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, ConversationId::from("c1"));
    assert_eq!(records[0].unread_count, 2);
}

#[tokio::test]
async fn history_tolerates_missing_fields_and_null_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"role": "user", "content": "hi", "created_at": "2026-03-01T12:00:00Z"},
            {"role": "assistant", "content": null},
            {}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/empty/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let history = backend.load_history(&ConversationId::from("c1")).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].role, Some(Role::Agent));
    assert_eq!(history[1].content, None);
    assert!(
        backend
            .load_history(&ConversationId::from("empty"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn non_success_status_surfaces_body_as_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(422).set_body_string("agent_id is required"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .send_simple(&AgentId::from("a1"), "hi", None)
        .await
        .unwrap_err();
    match err {
        MurmurError::Http { status, detail } => {
            assert_eq!(status, 422);
            assert_eq!(detail, "agent_id is required");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/escalations"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server).list_escalations().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend_with(&server, StaticCredentials::none())
        .list_escalations()
        .await
        .unwrap_err();
    assert!(matches!(err, MurmurError::NotAuthenticated(_)));
}

#[tokio::test]
async fn idempotent_reads_retry_once_on_503() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/escalations"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/escalations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(backend(&server).list_escalations().await.unwrap().is_empty());
}

#[tokio::test]
async fn retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/escalations"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(2)
        .mount(&server)
        .await;

    let err = backend(&server).list_escalations().await.unwrap_err();
    assert!(matches!(err, MurmurError::Http { status: 429, .. }));
}

#[tokio::test]
async fn writes_are_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/escalations/e1/decline"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server)
        .decline_escalation(&EscalationId::from("e1"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn escalation_calls_use_documented_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/a1/knowledge"))
        .and(body_json(serde_json::json!({
            "title": "Do you ship to Norway?",
            "content": "Yes.",
            "topic": "escalation",
            "layer": "friends",
            "is_pinned": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "k1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/escalations/e1/mark-answered"))
        .and(body_json(serde_json::json!({"answer": "Yes.", "layer": "friends"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/escalations/e2/decline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server);
    let receipt = backend
        .publish_knowledge(&KnowledgeDraft {
            agent_id: AgentId::from("a1"),
            title: "Do you ship to Norway?".into(),
            content: "Yes.".into(),
            topic: "escalation".into(),
            layer: Layer::Friends,
            is_pinned: false,
        })
        .await
        .unwrap();
    assert_eq!(receipt.id.as_deref(), Some("k1"));
    backend
        .mark_escalation_answered(&EscalationId::from("e1"), "Yes.", Layer::Friends)
        .await
        .unwrap();
    backend
        .decline_escalation(&EscalationId::from("e2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn streamed_send_yields_decodable_body() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"event\":\"start\",\"model\":\"m\"}\n",
        "data: {\"token\":\"Hel\"}\n",
        "data: {\"token\":\"lo\"}\n",
        "data: {\"event\":\"complete\",\"message_id\":\"m1\"}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .and(body_json(serde_json::json!({"conversation_id": "c1", "message": "Hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = backend(&server)
        .send_streaming(&ConversationId::from("c1"), "Hi")
        .await
        .unwrap();
    let events: Vec<_> = decode_stream(bytes).collect().await;
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            Ok(StreamEvent::Token(t)) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hello");
    assert!(matches!(
        events.last(),
        Some(Ok(StreamEvent::Complete { message_id: Some(id) })) if id == "m1"
    ));
}

#[tokio::test]
async fn start_chat_returns_the_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .and(body_json(serde_json::json!({"agent_id": "a9"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "c-new",
            "category": "direct_chat",
            "counterpart": {"kind": "agent", "id": "a9", "name": "Nova"}
        })))
        .mount(&server)
        .await;

    let record = backend(&server).start_chat(&AgentId::from("a9")).await.unwrap();
    assert_eq!(record.id, ConversationId::from("c-new"));
}

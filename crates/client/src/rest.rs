//! Bridge-backed implementation of [`DirectClient`].
//!
//! The unofficial client runs as a local sidecar exposing an
//! instagrapi-rest style JSON API. This type does parameter marshaling
//! only; device spoofing, request signing, challenge handling and rate
//! limiting all live behind the bridge.
//!
//! Endpoints used, relative to the configured base URL:
//!
//! | call                | endpoint           | body                              |
//! |---------------------|--------------------|-----------------------------------|
//! | `login`             | `POST /auth/login`   | `{username, password}`          |
//! | `current_user_id`   | `POST /auth/me`      | `{settings}`                    |
//! | `list_threads`      | `POST /direct/threads` | `{settings, amount}`          |
//! | `list_messages`     | `POST /direct/messages` | `{settings, thread_id, amount}` |
//! | `send_message`      | `POST /direct/send`  | `{settings, thread_id, text}`   |

use std::time::Duration;

use {
    async_trait::async_trait,
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::debug,
};

use crate::{
    api::DirectClient,
    error::ClientError,
    types::{DirectMessage, DirectThread},
};

#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    http: reqwest::Client,
    settings: Option<Value>,
}

#[derive(Deserialize)]
struct LoginResponse {
    settings: Value,
}

#[derive(Deserialize)]
struct MeResponse {
    user_id: u64,
}

#[derive(Deserialize)]
struct ThreadsResponse {
    threads: Vec<DirectThread>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    messages: Vec<DirectMessage>,
}

#[derive(Deserialize)]
struct SendResponse {
    message_id: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            settings: None,
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "bridge request");
        self.http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    /// Pull a human-readable reason out of a non-success bridge response.
    async fn failure_detail(resp: reqwest::Response) -> String {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(body);
        if detail.is_empty() {
            status.to_string()
        } else {
            detail
        }
    }

    fn settings_or_null(&self) -> Value {
        self.settings.clone().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl DirectClient for RestClient {
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let resp = self
            .post("/auth/login", json!({
                "username": username,
                "password": password,
            }))
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ClientError::InvalidCredentials(
                Self::failure_detail(resp).await,
            ));
        }
        if !resp.status().is_success() {
            return Err(ClientError::Api(Self::failure_detail(resp).await));
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("malformed login response: {e}")))?;
        self.settings = Some(body.settings);
        Ok(())
    }

    fn get_settings(&self) -> Option<Value> {
        self.settings.clone()
    }

    fn set_settings(&mut self, settings: Value) {
        self.settings = Some(settings);
    }

    async fn current_user_id(&self) -> Result<Option<u64>, ClientError> {
        // Without settings there is no identity to probe.
        if self.settings.is_none() {
            return Ok(None);
        }

        let resp = self
            .post("/auth/me", json!({ "settings": self.settings_or_null() }))
            .await?;

        // The bridge answers 401 when the settings no longer resolve to a
        // user; that is "unresolved", not a fault.
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ClientError::Api(Self::failure_detail(resp).await));
        }

        let body: MeResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("malformed identity response: {e}")))?;
        Ok(Some(body.user_id))
    }

    async fn list_threads(&self, amount: usize) -> Result<Vec<DirectThread>, ClientError> {
        let resp = self
            .post("/direct/threads", json!({
                "settings": self.settings_or_null(),
                "amount": amount,
            }))
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::Api(Self::failure_detail(resp).await));
        }
        let body: ThreadsResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("malformed thread listing: {e}")))?;
        Ok(body.threads)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        amount: usize,
    ) -> Result<Vec<DirectMessage>, ClientError> {
        let resp = self
            .post("/direct/messages", json!({
                "settings": self.settings_or_null(),
                "thread_id": thread_id,
                "amount": amount,
            }))
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::Api(Self::failure_detail(resp).await));
        }
        let body: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("malformed message listing: {e}")))?;
        Ok(body.messages)
    }

    async fn send_message(&self, thread_id: &str, text: &str) -> Result<String, ClientError> {
        let resp = self
            .post("/direct/send", json!({
                "settings": self.settings_or_null(),
                "thread_id": thread_id,
                "text": text,
            }))
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::Api(Self::failure_detail(resp).await));
        }
        let body: SendResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Api(format!("malformed send response: {e}")))?;
        Ok(body.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::Server) -> RestClient {
        RestClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn login_captures_settings() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"settings":{"uuid":"abc","device_id":"d1"}}"#)
            .create_async()
            .await;

        let mut cl = client(&server);
        cl.login("alice", "secret").await.unwrap();

        mock.assert_async().await;
        let settings = cl.get_settings().unwrap();
        assert_eq!(settings["uuid"], "abc");
    }

    #[tokio::test]
    async fn login_rejection_is_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"detail":"bad password"}"#)
            .create_async()
            .await;

        let mut cl = client(&server);
        let err = cl.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials(ref d) if d == "bad password"));
    }

    #[tokio::test]
    async fn identity_probe_without_settings_skips_network() {
        // No mock registered: a request would fail the connect and surface
        // as Transport, so Ok(None) proves no call was made.
        let server = mockito::Server::new_async().await;
        let cl = client(&server);
        assert_eq!(cl.current_user_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stale_settings_resolve_to_no_identity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/me")
            .with_status(401)
            .with_body(r#"{"detail":"login_required"}"#)
            .create_async()
            .await;

        let mut cl = client(&server);
        cl.set_settings(serde_json::json!({"uuid": "stale"}));
        assert_eq!(cl.current_user_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn identity_probe_returns_user_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/me")
            .with_status(200)
            .with_body(r#"{"user_id":4242}"#)
            .create_async()
            .await;

        let mut cl = client(&server);
        cl.set_settings(serde_json::json!({"uuid": "abc"}));
        assert_eq!(cl.current_user_id().await.unwrap(), Some(4242));
    }

    #[tokio::test]
    async fn thread_listing_parses_participants() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/direct/threads")
            .with_status(200)
            .with_body(
                r#"{"threads":[
                    {"id":"t1","participants":["bob"]},
                    {"id":"t2","participants":["carol","dave"]},
                    {"id":"t3","participants":[]}
                ]}"#,
            )
            .create_async()
            .await;

        let cl = client(&server);
        let threads = cl.list_threads(50).await.unwrap();
        assert_eq!(threads.len(), 3);
        assert_eq!(threads[1].participants, vec!["carol", "dave"]);
        assert!(threads[2].participants.is_empty());
    }

    #[tokio::test]
    async fn message_listing_tolerates_absent_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/direct/messages")
            .with_status(200)
            .with_body(
                r#"{"messages":[
                    {"id":"m1","sender_id":7,"timestamp":"2025-06-01T10:00:00Z","text":"hi"},
                    {"id":"m2","item_type":"media"}
                ]}"#,
            )
            .create_async()
            .await;

        let cl = client(&server);
        let msgs = cl.list_messages("t1", 200).await.unwrap();
        assert_eq!(msgs[0].text.as_deref(), Some("hi"));
        assert!(msgs[1].timestamp.is_none());
        assert_eq!(msgs[1].item_type.as_deref(), Some("media"));
    }

    #[tokio::test]
    async fn server_fault_surfaces_as_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/direct/send")
            .with_status(500)
            .with_body(r#"{"detail":"rate limited"}"#)
            .create_async()
            .await;

        let cl = client(&server);
        let err = cl.send_message("t1", "hello").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(ref d) if d == "rate limited"));
    }
}

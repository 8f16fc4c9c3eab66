use {async_trait::async_trait, serde_json::Value};

use crate::{
    error::ClientError,
    types::{DirectMessage, DirectThread},
};

/// Capability surface of the external direct-message client.
///
/// One instance is constructed per incoming request and discarded with it;
/// implementations carry no state beyond the settings blob applied to them.
#[async_trait]
pub trait DirectClient: Send + Sync {
    /// Perform a fresh credential login. On success the client holds a new
    /// settings blob retrievable via [`get_settings`](Self::get_settings).
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError>;

    /// The opaque session settings the client currently holds, if any.
    /// igdm stores this blob verbatim and never inspects its fields.
    fn get_settings(&self) -> Option<Value>;

    /// Supply a previously captured settings blob, verbatim.
    fn set_settings(&mut self, settings: Value);

    /// The acting user's id, or `None` when the client cannot resolve an
    /// identity from its current settings (absent or expired session).
    async fn current_user_id(&self) -> Result<Option<u64>, ClientError>;

    /// List conversations, newest activity first (the client's ordering).
    async fn list_threads(&self, amount: usize) -> Result<Vec<DirectThread>, ClientError>;

    /// List messages in one thread, in whatever order the client returns.
    async fn list_messages(
        &self,
        thread_id: &str,
        amount: usize,
    ) -> Result<Vec<DirectMessage>, ClientError>;

    /// Send a text message to a thread. Returns the new message id.
    async fn send_message(&self, thread_id: &str, text: &str) -> Result<String, ClientError>;
}

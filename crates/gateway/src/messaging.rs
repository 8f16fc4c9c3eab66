use thiserror::Error;

use igdm_client::{ClientError, DirectClient, DirectMessage, DirectThread};

/// Fault while listing or sending after a successful resolve.
///
/// No retries at this layer; whatever backoff the external client applies
/// is its own business.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected locally, before any external call.
    #[error("message text is empty")]
    EmptyMessage,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// List conversations in the order the external client returns them
/// (most-recent-activity first is its contract; no re-sort here).
pub async fn list_threads(
    client: &dyn DirectClient,
    amount: usize,
) -> Result<Vec<DirectThread>, GatewayError> {
    Ok(client.list_threads(amount).await?)
}

/// List messages in one thread, oldest first.
///
/// The sort is stable and absent timestamps order as earliest, so entries
/// without a timestamp keep the relative order the client supplied. The
/// view depends on this causal left-to-right ordering.
pub async fn list_messages(
    client: &dyn DirectClient,
    thread_id: &str,
    amount: usize,
) -> Result<Vec<DirectMessage>, GatewayError> {
    let mut messages = client.list_messages(thread_id, amount).await?;
    // `None < Some(_)`, which is exactly the absent-first ordering we need.
    messages.sort_by_key(|m| m.timestamp);
    Ok(messages)
}

/// Send a text message. Empty or whitespace-only text is rejected locally
/// with no external call.
pub async fn send_message(
    client: &dyn DirectClient,
    thread_id: &str,
    text: &str,
) -> Result<String, GatewayError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GatewayError::EmptyMessage);
    }
    Ok(client.send_message(thread_id, text).await?)
}

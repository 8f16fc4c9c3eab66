use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// A conversation as reported by the external client.
///
/// Ordering of a thread listing is the external client's contract
/// (most-recent-activity first); igdm never re-sorts threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectThread {
    /// Opaque thread identifier.
    pub id: String,
    /// Participant usernames, excluding the acting user.
    #[serde(default)]
    pub participants: Vec<String>,
}

/// A single message inside a thread.
///
/// Fields the external client may omit are explicit options with defined
/// fallbacks at the rendering layer, instead of presence probing scattered
/// through views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    /// Opaque message identifier.
    pub id: String,
    /// Numeric sender id; absent for system entries.
    #[serde(default)]
    pub sender_id: Option<u64>,
    /// Delivery timestamp; absent entries sort as earliest.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Message text. Absence implies a non-text payload.
    #[serde(default)]
    pub text: Option<String>,
    /// Item kind reported by the client for non-text payloads
    /// (e.g. "media", "clip", "voice_media").
    #[serde(default)]
    pub item_type: Option<String>,
}

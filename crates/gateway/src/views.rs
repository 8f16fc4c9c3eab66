use {
    askama::Template,
    axum::{
        http::StatusCode,
        response::{Html, IntoResponse, Response},
    },
    tracing::error,
};

use igdm_client::{DirectMessage, DirectThread};

// ── Templates ────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginView {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "threads.html")]
pub struct ThreadsView {
    pub threads: Vec<ThreadRow>,
}

pub struct ThreadRow {
    pub id: String,
    pub title: String,
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadView {
    pub thread_id: String,
    pub messages: Vec<MessageRow>,
}

pub struct MessageRow {
    pub timestamp: String,
    pub sender: String,
    pub text: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorView {
    pub message: String,
    pub back_href: String,
    pub back_label: String,
}

impl ErrorView {
    pub fn new(message: impl Into<String>, back_href: &str, back_label: &str) -> Self {
        Self {
            message: message.into(),
            back_href: back_href.into(),
            back_label: back_label.into(),
        }
    }
}

/// Render a template into a response; a failed render is a plain 500.
pub fn render<T: Template>(view: &T) -> Response {
    match view.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "render error").into_response()
        },
    }
}

// ── Row construction ─────────────────────────────────────────────────────────

/// Comma-joined participant list, or `(thread <id>)` when the client
/// reported no participants.
pub fn thread_title(thread: &DirectThread) -> String {
    let title = thread.participants.join(", ");
    if title.trim().is_empty() {
        format!("(thread {})", thread.id)
    } else {
        title
    }
}

pub fn thread_row(thread: &DirectThread) -> ThreadRow {
    ThreadRow {
        id: thread.id.clone(),
        title: thread_title(thread),
    }
}

/// Flatten one message for display: `?` for a missing timestamp, `you` /
/// sender id / `system/unknown` for the sender, `[<item_type>]` for
/// non-text payloads.
pub fn message_row(message: &DirectMessage, acting_user: u64) -> MessageRow {
    let timestamp = message
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "?".into());

    let sender = match message.sender_id {
        Some(id) if id == acting_user => "you".into(),
        Some(id) => id.to_string(),
        None => "system/unknown".into(),
    };

    let text = match &message.text {
        Some(text) => text.clone(),
        None => format!("[{}]", message.item_type.as_deref().unwrap_or("non-text")),
    };

    MessageRow {
        timestamp,
        sender,
        text,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn thread(id: &str, participants: &[&str]) -> DirectThread {
        DirectThread {
            id: id.into(),
            participants: participants.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn titles_join_participants_with_fallback() {
        assert_eq!(thread_title(&thread("t1", &["bob"])), "bob");
        assert_eq!(
            thread_title(&thread("t2", &["carol", "dave"])),
            "carol, dave"
        );
        assert_eq!(thread_title(&thread("t3", &[])), "(thread t3)");
    }

    #[test]
    fn rows_label_senders_and_fallbacks() {
        let base = DirectMessage {
            id: "m1".into(),
            sender_id: Some(42),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).single(),
            text: Some("hello".into()),
            item_type: None,
        };

        let row = message_row(&base, 42);
        assert_eq!(row.sender, "you");
        assert_eq!(row.timestamp, "2025-06-01 10:30:00");
        assert_eq!(row.text, "hello");

        let other = message_row(
            &DirectMessage {
                sender_id: Some(7),
                ..base.clone()
            },
            42,
        );
        assert_eq!(other.sender, "7");

        let system = message_row(
            &DirectMessage {
                sender_id: None,
                timestamp: None,
                ..base.clone()
            },
            42,
        );
        assert_eq!(system.sender, "system/unknown");
        assert_eq!(system.timestamp, "?");

        let media = message_row(
            &DirectMessage {
                text: None,
                item_type: Some("clip".into()),
                ..base
            },
            42,
        );
        assert_eq!(media.text, "[clip]");
    }

    #[test]
    fn templates_render() {
        let login = LoginView {
            error: Some("bad password".into()),
        };
        assert!(login.render().unwrap().contains("bad password"));

        let threads = ThreadsView {
            threads: vec![thread_row(&thread("t3", &[]))],
        };
        assert!(threads.render().unwrap().contains("(thread t3)"));

        let detail = ThreadView {
            thread_id: "t1".into(),
            messages: vec![MessageRow {
                timestamp: "?".into(),
                sender: "you".into(),
                text: "hi".into(),
            }],
        };
        let html = detail.render().unwrap();
        assert!(html.contains("you"));
        assert!(html.contains("data-thread-id=\"t1\""));
    }
}

use {
    axum::{
        extract::{Multipart, Path, State},
        http::{StatusCode, header},
        response::{IntoResponse, Json, Redirect, Response},
    },
    axum_extra::extract::cookie::{Cookie, CookieJar},
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::debug,
};

use {
    igdm_auth::{AuthError, CarrierPayload, Resolved, resolve},
    igdm_client::DirectClient,
};

use crate::{
    messaging::{self, GatewayError},
    state::AppState,
    views::{self, ErrorView, LoginView, ThreadView, ThreadsView},
};

// ── Session plumbing ─────────────────────────────────────────────────────────

/// Decode the carrier cookie and resolve it into a request-scoped handle.
/// A missing or unverifiable cookie resolves exactly like an empty one.
async fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<(Box<dyn DirectClient>, Resolved), AuthError> {
    let token = jar.get(state.cookie_name()).map(|c| c.value().to_string());
    let carrier_in = state.carrier.decode(token.as_deref()).unwrap_or_default();

    let mut client = (state.clients)();
    let resolved = resolve(&mut *client, &carrier_in).await?;
    Ok((client, resolved))
}

fn carrier_cookie(state: &AppState, payload: &CarrierPayload) -> Cookie<'static> {
    Cookie::build((state.cookie_name().to_string(), state.carrier.encode(payload)))
        .path("/")
        .http_only(true)
        .build()
}

fn login_error(message: String) -> Response {
    views::render(&LoginView {
        error: Some(message),
    })
}

/// Page-route auth failures: unauthenticated goes to the login form,
/// everything else renders inline with a way back.
fn auth_error_page(err: AuthError) -> Response {
    match err {
        AuthError::NotLoggedIn => Redirect::to("/login").into_response(),
        e => views::render(&ErrorView::new(e.to_string(), "/login", "Back to login")),
    }
}

// ── Routes ───────────────────────────────────────────────────────────────────

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    if jar.get(state.cookie_name()).is_some() {
        Redirect::to("/threads")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_form() -> Response {
    views::render(&LoginView { error: None })
}

/// Login submission: either a username/password form or an uploaded
/// session file. Exactly one path is taken per submission; a non-empty
/// file wins.
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    mut form: Multipart,
) -> Response {
    let mut username = String::new();
    let mut password = String::new();
    let mut session_file: Option<String> = None;

    loop {
        match form.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                let value = match field.text().await {
                    Ok(v) => v,
                    Err(e) => return login_error(format!("form read failed: {e}")),
                };
                match name.as_str() {
                    "username" => username = value.trim().to_string(),
                    "password" => password = value.trim().to_string(),
                    "session_file" if !value.is_empty() => session_file = Some(value),
                    _ => {},
                }
            },
            Ok(None) => break,
            Err(e) => return login_error(format!("form read failed: {e}")),
        }
    }

    if let Some(raw) = session_file {
        return import_session(&state, jar, &raw).await;
    }

    if username.is_empty() || password.is_empty() {
        return login_error("username and password are required".into());
    }

    let carrier_in = CarrierPayload {
        username: Some(username),
        password: Some(password),
        settings: None,
    };
    let mut client = (state.clients)();
    match resolve(&mut *client, &carrier_in).await {
        Ok(resolved) => {
            debug!(user_id = resolved.user_id, "login complete");
            let jar = jar.add(carrier_cookie(&state, &resolved.carrier_out));
            (jar, Redirect::to("/threads")).into_response()
        },
        Err(e) => login_error(e.to_string()),
    }
}

/// Accept an uploaded Credential Bundle, validated by one external call
/// before it is allowed into the carrier. Anything short of a resolved
/// identity is a failed login attempt, never a partial success.
async fn import_session(state: &AppState, jar: CookieJar, raw: &str) -> Response {
    let settings: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return login_error(format!("session file is not valid JSON: {e}")),
    };

    let mut client = (state.clients)();
    client.set_settings(settings.clone());
    match client.current_user_id().await {
        Ok(Some(user_id)) => {
            debug!(user_id, "session file accepted");
            let payload = CarrierPayload {
                settings: Some(settings),
                ..Default::default()
            };
            let jar = jar.add(carrier_cookie(state, &payload));
            (jar, Redirect::to("/threads")).into_response()
        },
        Ok(None) => login_error("session file no longer resolves an identity".into()),
        Err(e) => login_error(e.to_string()),
    }
}

/// Clears the carrier unconditionally; safe to hit twice.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = jar.remove(
        Cookie::build((state.cookie_name().to_string(), ""))
            .path("/")
            .build(),
    );
    (jar, Redirect::to("/login")).into_response()
}

pub async fn threads(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (client, resolved) = match resolve_session(&state, &jar).await {
        Ok(v) => v,
        Err(e) => return auth_error_page(e),
    };

    match messaging::list_threads(&*client, state.config.limits.threads_per_page).await {
        Ok(threads) => {
            let view = ThreadsView {
                threads: threads.iter().map(views::thread_row).collect(),
            };
            let jar = jar.add(carrier_cookie(&state, &resolved.carrier_out));
            (jar, views::render(&view)).into_response()
        },
        Err(e) => views::render(&ErrorView::new(e.to_string(), "/threads", "Retry")),
    }
}

pub async fn thread_detail(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    jar: CookieJar,
) -> Response {
    let (client, resolved) = match resolve_session(&state, &jar).await {
        Ok(v) => v,
        Err(e) => return auth_error_page(e),
    };

    let amount = state.config.limits.messages_per_thread;
    match messaging::list_messages(&*client, &thread_id, amount).await {
        Ok(messages) => {
            let view = ThreadView {
                thread_id,
                messages: messages
                    .iter()
                    .map(|m| views::message_row(m, resolved.user_id))
                    .collect(),
            };
            let jar = jar.add(carrier_cookie(&state, &resolved.carrier_out));
            (jar, views::render(&view)).into_response()
        },
        Err(e) => views::render(&ErrorView::new(e.to_string(), "/threads", "Back to threads")),
    }
}

#[derive(Deserialize)]
pub struct SendBody {
    pub text: String,
}

/// Async send path: a minimal machine-readable ack, never a redirect.
pub async fn send(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    jar: CookieJar,
    Json(body): Json<SendBody>,
) -> Response {
    let (client, resolved) = match resolve_session(&state, &jar).await {
        Ok(v) => v,
        Err(e) => return send_failure(e),
    };

    match messaging::send_message(&*client, &thread_id, &body.text).await {
        Ok(id) => {
            let jar = jar.add(carrier_cookie(&state, &resolved.carrier_out));
            (jar, Json(json!({ "ok": true, "id": id }))).into_response()
        },
        Err(GatewayError::EmptyMessage) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "ok": false, "error": "message text is empty" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

fn send_failure(err: AuthError) -> Response {
    let status = match err {
        AuthError::NotLoggedIn | AuthError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        AuthError::Transient(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "ok": false, "error": err.to_string() }))).into_response()
}

/// Download the current Credential Bundle as a JSON document.
pub async fn session_export(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (_client, resolved) = match resolve_session(&state, &jar).await {
        Ok(v) => v,
        Err(AuthError::NotLoggedIn) => {
            return (StatusCode::NOT_FOUND, "no active session").into_response();
        },
        Err(e) => return (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    };

    let Some(settings) = &resolved.carrier_out.settings else {
        return (StatusCode::NOT_FOUND, "no active session").into_response();
    };
    let body = serde_json::to_string_pretty(settings).unwrap_or_default();

    let jar = jar.add(carrier_cookie(&state, &resolved.carrier_out));
    (
        jar,
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"igdm_session.json\"",
            ),
        ],
        body,
    )
        .into_response()
}

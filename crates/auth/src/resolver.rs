use {thiserror::Error, tracing::debug};

use igdm_client::{ClientError, DirectClient};

use crate::carrier::CarrierPayload;

// ── Types ────────────────────────────────────────────────────────────────────

/// Why a request could not be tied to an acting user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bundle and no credentials present. No external call was made.
    #[error("not logged in")]
    NotLoggedIn,

    /// The external client explicitly rejected the supplied credentials
    /// or uploaded bundle.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Network fault, timeout or unexpected client error mid-resolve.
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Per-request classification of what the carrier held.
///
/// Constructed fresh from cookie state on every request, never shared. Its
/// only durable trace is the payload written back into the response cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRecord {
    Empty,
    BundleOnly,
    CredentialsOnly,
    CredentialsPlusBundle,
}

impl SessionRecord {
    pub fn classify(payload: &CarrierPayload) -> Self {
        match (payload.has_credentials(), payload.settings.is_some()) {
            (false, false) => Self::Empty,
            (false, true) => Self::BundleOnly,
            (true, false) => Self::CredentialsOnly,
            (true, true) => Self::CredentialsPlusBundle,
        }
    }
}

/// Outcome of a successful resolve: the client passed in now holds working
/// session settings, and `carrier_out` is what the response cookie must say.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Acting user id, used by views to tell "my" messages apart.
    pub user_id: u64,
    pub carrier_out: CarrierPayload,
}

// ── Resolve ──────────────────────────────────────────────────────────────────

/// Turn carrier contents into an authenticated client handle.
///
/// Reuses the carried bundle when the client still resolves an identity
/// from it; otherwise falls back to stored raw credentials and performs
/// exactly one fresh login. A request that already proved its bundle
/// resolvable never triggers a login, so retries with an unchanged cookie
/// stay idempotent.
pub async fn resolve(
    client: &mut dyn DirectClient,
    carrier_in: &CarrierPayload,
) -> Result<Resolved, AuthError> {
    let record = SessionRecord::classify(carrier_in);
    if record == SessionRecord::Empty {
        return Err(AuthError::NotLoggedIn);
    }

    // Reuse the prior bundle when present: apply it and probe the identity.
    if let Some(settings) = &carrier_in.settings {
        client.set_settings(settings.clone());
        match client.current_user_id().await {
            Ok(Some(user_id)) => {
                debug!(user_id, "session bundle still resolvable");
                return Ok(Resolved {
                    user_id,
                    carrier_out: carrier_in.clone(),
                });
            },
            // Stale or rejected bundle: degrade to the credentials path.
            Ok(None) => debug!("session bundle no longer resolves an identity"),
            Err(ClientError::InvalidCredentials(reason)) => {
                debug!(%reason, "session bundle rejected by client");
            },
            Err(e) => return Err(AuthError::Transient(e.to_string())),
        }
    }

    let (Some(username), Some(password)) = (&carrier_in.username, &carrier_in.password) else {
        // BundleOnly with a dead bundle behaves as Empty for this request.
        return Err(AuthError::NotLoggedIn);
    };

    match client.login(username, password).await {
        Ok(()) => {},
        Err(ClientError::InvalidCredentials(reason)) => {
            return Err(AuthError::InvalidCredentials(reason));
        },
        Err(e) => return Err(AuthError::Transient(e.to_string())),
    }

    let user_id = match client.current_user_id().await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return Err(AuthError::Transient(
                "login succeeded without a resolvable identity".into(),
            ));
        },
        Err(e) => return Err(AuthError::Transient(e.to_string())),
    };

    debug!(user_id, "fresh login complete, carrying refreshed bundle");

    // The raw credentials stay in the outgoing carrier beside the fresh
    // bundle so the next bundle expiry self-heals without re-prompting.
    Ok(Resolved {
        user_id,
        carrier_out: CarrierPayload {
            username: Some(username.clone()),
            password: Some(password.clone()),
            settings: client.get_settings(),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use {
        async_trait::async_trait,
        serde_json::{Value, json},
    };

    use {
        super::*,
        igdm_client::{DirectMessage, DirectThread},
    };

    /// Scriptable stand-in for the external client, with call counters for
    /// the no-network assertions.
    #[derive(Default)]
    struct FakeClient {
        settings: Option<Value>,
        /// Settings blob that resolves, and the identity it resolves to.
        valid_settings: Option<(Value, u64)>,
        /// Accepted credentials and the fresh settings login produces.
        valid_login: Option<(String, String, u64, Value)>,
        /// When set, every network call fails with this transport error.
        transport_down: bool,
        login_calls: AtomicUsize,
        network_calls: AtomicUsize,
    }

    impl FakeClient {
        fn resolved_id(&self) -> Option<u64> {
            let (valid, id) = self.valid_settings.as_ref()?;
            (self.settings.as_ref() == Some(valid)).then_some(*id)
        }
    }

    #[async_trait]
    impl DirectClient for FakeClient {
        async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            self.network_calls.fetch_add(1, Ordering::SeqCst);
            if self.transport_down {
                return Err(ClientError::Transport("connection refused".into()));
            }
            match &self.valid_login {
                Some((u, p, id, fresh)) if u == username && p == password => {
                    self.settings = Some(fresh.clone());
                    self.valid_settings = Some((fresh.clone(), *id));
                    Ok(())
                },
                _ => Err(ClientError::InvalidCredentials("bad password".into())),
            }
        }

        fn get_settings(&self) -> Option<Value> {
            self.settings.clone()
        }

        fn set_settings(&mut self, settings: Value) {
            self.settings = Some(settings);
        }

        async fn current_user_id(&self) -> Result<Option<u64>, ClientError> {
            self.network_calls.fetch_add(1, Ordering::SeqCst);
            if self.transport_down {
                return Err(ClientError::Transport("connection refused".into()));
            }
            Ok(self.resolved_id())
        }

        async fn list_threads(&self, _amount: usize) -> Result<Vec<DirectThread>, ClientError> {
            unimplemented!("not exercised by resolver tests")
        }

        async fn list_messages(
            &self,
            _thread_id: &str,
            _amount: usize,
        ) -> Result<Vec<DirectMessage>, ClientError> {
            unimplemented!("not exercised by resolver tests")
        }

        async fn send_message(&self, _thread_id: &str, _text: &str) -> Result<String, ClientError> {
            unimplemented!("not exercised by resolver tests")
        }
    }

    fn bundle() -> Value {
        json!({"uuid": "abc"})
    }

    fn creds_payload() -> CarrierPayload {
        CarrierPayload {
            username: Some("alice".into()),
            password: Some("secret".into()),
            settings: None,
        }
    }

    #[test]
    fn classification_covers_all_variants() {
        assert_eq!(
            SessionRecord::classify(&CarrierPayload::default()),
            SessionRecord::Empty
        );
        assert_eq!(
            SessionRecord::classify(&CarrierPayload {
                settings: Some(bundle()),
                ..Default::default()
            }),
            SessionRecord::BundleOnly
        );
        assert_eq!(
            SessionRecord::classify(&creds_payload()),
            SessionRecord::CredentialsOnly
        );
        assert_eq!(
            SessionRecord::classify(&CarrierPayload {
                settings: Some(bundle()),
                ..creds_payload()
            }),
            SessionRecord::CredentialsPlusBundle
        );
    }

    #[tokio::test]
    async fn empty_carrier_makes_no_external_call() {
        let mut client = FakeClient::default();
        let err = resolve(&mut client, &CarrierPayload::default())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::NotLoggedIn);
        assert_eq!(client.network_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_bundle_resolves_without_login() {
        let mut client = FakeClient {
            valid_settings: Some((bundle(), 42)),
            ..Default::default()
        };
        let carrier_in = CarrierPayload {
            settings: Some(bundle()),
            ..Default::default()
        };

        let resolved = resolve(&mut client, &carrier_in).await.unwrap();
        assert_eq!(resolved.user_id, 42);
        assert_eq!(resolved.carrier_out, carrier_in);
        assert_eq!(client.login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_bundle_falls_back_to_one_login() {
        let fresh = json!({"uuid": "fresh"});
        let mut client = FakeClient {
            valid_login: Some(("alice".into(), "secret".into(), 42, fresh.clone())),
            ..Default::default()
        };
        let carrier_in = CarrierPayload {
            settings: Some(json!({"uuid": "expired"})),
            ..creds_payload()
        };

        let resolved = resolve(&mut client, &carrier_in).await.unwrap();
        assert_eq!(resolved.user_id, 42);
        assert_eq!(client.login_calls.load(Ordering::SeqCst), 1);
        // Refreshed bundle replaces the stale one; credentials are retained.
        assert_eq!(resolved.carrier_out.settings, Some(fresh));
        assert_eq!(resolved.carrier_out.username.as_deref(), Some("alice"));
        assert_eq!(resolved.carrier_out.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn invalid_credentials_surface_as_such() {
        let mut client = FakeClient::default();
        let err = resolve(&mut client, &creds_payload()).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials("bad password".into()));
    }

    #[tokio::test]
    async fn dead_bundle_without_credentials_is_not_logged_in() {
        let mut client = FakeClient::default();
        let carrier_in = CarrierPayload {
            settings: Some(json!({"uuid": "expired"})),
            ..Default::default()
        };
        let err = resolve(&mut client, &carrier_in).await.unwrap_err();
        assert_eq!(err, AuthError::NotLoggedIn);
        assert_eq!(client.login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_fault_is_transient() {
        let mut client = FakeClient {
            transport_down: true,
            ..Default::default()
        };
        let carrier_in = CarrierPayload {
            settings: Some(bundle()),
            ..creds_payload()
        };
        let err = resolve(&mut client, &carrier_in).await.unwrap_err();
        assert!(matches!(err, AuthError::Transient(_)));
    }

    #[tokio::test]
    async fn login_then_bundle_only_resolve_succeeds() {
        // First request: credentials only. Login issues bundle {"uuid":"abc"}.
        let mut client = FakeClient {
            valid_login: Some(("alice".into(), "secret".into(), 42, bundle())),
            ..Default::default()
        };
        let resolved = resolve(&mut client, &creds_payload()).await.unwrap();
        assert_eq!(resolved.carrier_out.settings, Some(bundle()));

        // Second request: the bundle alone, no raw credentials in sight.
        let mut client = FakeClient {
            valid_settings: Some((bundle(), 42)),
            ..Default::default()
        };
        let carrier_in = CarrierPayload {
            settings: Some(bundle()),
            ..Default::default()
        };
        let resolved = resolve(&mut client, &carrier_in).await.unwrap();
        assert_eq!(resolved.user_id, 42);
        assert_eq!(client.login_calls.load(Ordering::SeqCst), 0);
    }
}

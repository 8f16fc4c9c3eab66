use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    hmac::{Hmac, Mac},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    sha2::Sha256,
};

type HmacSha256 = Hmac<Sha256>;

// ── Payload ──────────────────────────────────────────────────────────────────

/// Everything the session cookie may carry.
///
/// `settings` is the opaque bundle issued by the external client after a
/// successful login; it is stored and re-supplied verbatim, never inspected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

impl CarrierPayload {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.settings.is_none()
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

// ── Codec ────────────────────────────────────────────────────────────────────

/// Signed token codec for the session cookie.
///
/// Token shape: `base64url(json) "." base64url(hmac-sha256(key, json))`.
/// Tamper-evident only: the payload is readable by anyone; see the crate
/// docs for the accepted credentials-in-cookie trade-off. Any token that
/// fails to parse or verify decodes as absent, so a rotated signing key
/// invalidates every outstanding cookie rather than erroring.
pub struct Carrier {
    key: Vec<u8>,
}

impl Carrier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    pub fn encode(&self, payload: &CarrierPayload) -> String {
        let body = serde_json::to_vec(payload).unwrap_or_default();
        let sig = self.sign(&body);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&body),
            URL_SAFE_NO_PAD.encode(&sig)
        )
    }

    /// Decode a cookie value. Absent, malformed, tampered and
    /// wrong-key tokens all yield `None`, never an error.
    pub fn decode(&self, token: Option<&str>) -> Option<CarrierPayload> {
        let token = token?;
        let (body_b64, sig_b64) = token.split_once('.')?;
        let body = URL_SAFE_NO_PAD.decode(body_b64).ok()?;
        let sig = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
        if !safe_equal(&self.sign(&body), &sig) {
            return None;
        }
        serde_json::from_slice(&body).ok()
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length, so construction cannot fail.
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            return Vec::new();
        };
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison (prevents timing attacks on the signature).
fn safe_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}

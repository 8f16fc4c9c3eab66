use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgdmConfig {
    pub gateway: GatewayConfig,
    pub bridge: BridgeConfig,
    pub session: SessionConfig,
    pub limits: LimitsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8470,
        }
    }
}

/// Where the private-API bridge sidecar listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub base_url: String,
    /// Per-request timeout. Anything longer is the bridge's business.
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_secs: 60,
        }
    }
}

/// Session cookie settings.
///
/// `secret_key` signs the carrier token. There is no built-in default: a
/// missing key is a startup error, and rotating it invalidates every
/// outstanding cookie (they decode as absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Signing secret; supports `${IGDM_SECRET}` style env references.
    pub secret_key: Option<String>,
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            cookie_name: "igdm_session".into(),
        }
    }
}

/// Page sizes for the external listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub threads_per_page: usize,
    pub messages_per_thread: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            threads_per_page: 50,
            messages_per_thread: 200,
        }
    }
}

//! Launch configuration for the stealth-browser engine.
//!
//! The engine's Node launcher reads a single base64-encoded JSON object from
//! stdin before it starts the browser. Keys are camelCase on the wire; `None`
//! fields are omitted entirely because the launcher treats an explicit `null`
//! proxy as a configuration error.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Default viewport for the persistent context.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

/// Browser viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Upstream proxy settings, when the engine should tunnel traffic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    pub server: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Configuration blob handed to the engine launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Run without a visible window.
    pub headless: bool,

    /// Viewport applied to contexts the engine creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    /// Cursor-humanization factor (0 disables, 0.5 is the engine default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humanize: Option<f64>,

    /// Upstream proxy. Omitted from the wire when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySettings>,

    /// Extra launcher arguments passed through verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl LaunchConfig {
    /// Creates a config with the standard persistent-context defaults.
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            viewport: Some(DEFAULT_VIEWPORT),
            humanize: None,
            proxy: None,
            args: Vec::new(),
        }
    }

    /// Serializes the config the way the launcher expects it on stdin:
    /// camelCase JSON, base64-encoded, no trailing newline.
    pub fn to_stdin_payload(&self) -> serde_json::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_camel_case_and_none_proxy_is_omitted() {
        let config = LaunchConfig::new(true);
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["headless"], serde_json::json!(true));
        assert_eq!(json["viewport"]["width"], serde_json::json!(1920));
        assert!(json.get("proxy").is_none());
        assert!(json.get("humanize").is_none());
    }

    #[test]
    fn stdin_payload_round_trips_through_base64() {
        use base64::Engine as _;

        let mut config = LaunchConfig::new(false);
        config.humanize = Some(0.5);

        let payload = config.to_stdin_payload().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        let parsed: LaunchConfig = serde_json::from_slice(&decoded).unwrap();

        assert!(!parsed.headless);
        assert_eq!(parsed.humanize, Some(0.5));
    }
}

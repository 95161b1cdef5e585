//! Shared primitive types.

use serde::{Deserialize, Serialize};

/// When a navigation is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    #[default]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
        }
    }
}

/// A WebSocket endpoint advertised by the engine launcher.
///
/// The string is opaque to everything downstream of the launcher: clients
/// validate it by connecting, never by inspecting it. Parsing here only
/// rejects values that cannot possibly be an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WsEndpoint(String);

impl WsEndpoint {
    /// Accepts a `ws://` or `wss://` URL with a host part; anything else is
    /// rejected so stale garbage in a session file never reaches the dialer.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let rest = raw
            .strip_prefix("ws://")
            .or_else(|| raw.strip_prefix("wss://"))?;
        if rest.is_empty() || rest.starts_with('/') {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WsEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_ws_urls() {
        assert!(WsEndpoint::parse("ws://localhost:33445/a1b2c3").is_some());
        assert!(WsEndpoint::parse("wss://10.0.0.2:9222/session").is_some());
        assert!(WsEndpoint::parse("  ws://localhost:1/x  ").is_some());
    }

    #[test]
    fn parse_rejects_non_endpoints() {
        assert!(WsEndpoint::parse("").is_none());
        assert!(WsEndpoint::parse("http://localhost:1").is_none());
        assert!(WsEndpoint::parse("ws://").is_none());
        assert!(WsEndpoint::parse("ws:///nohost").is_none());
    }
}

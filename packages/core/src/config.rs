//! Client configuration.

use serde::{Deserialize, Serialize};

/// Record time-to-live applied by writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// Use the namespace's configured default TTL.
    #[default]
    NamespaceDefault,
    /// Never expire.
    Never,
    /// Expire this many seconds after the write.
    Seconds(u32),
}

/// Where to connect and which defaults to write with.
///
/// Every field has a default, so partial JSON works:
///
/// ```rust
/// use binstore_core::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{"port": 3100}"#).unwrap();
/// assert_eq!(config.host, "127.0.0.1");
/// assert_eq!(config.port, 3100);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub default_expiration: Expiration,
}

impl ClientConfig {
    pub const DEFAULT_PORT: u16 = 3000;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.default_expiration = expiration;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Self::DEFAULT_PORT,
            default_expiration: Expiration::NamespaceDefault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_expiration, Expiration::NamespaceDefault);
    }

    #[test]
    fn expiration_from_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"host": "db", "default_expiration": {"seconds": 60}}"#)
                .unwrap();
        assert_eq!(config.host, "db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_expiration, Expiration::Seconds(60));

        let config: ClientConfig =
            serde_json::from_str(r#"{"default_expiration": "never"}"#).unwrap();
        assert_eq!(config.default_expiration, Expiration::Never);
    }
}

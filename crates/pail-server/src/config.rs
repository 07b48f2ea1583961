use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const ENDPOINT_VAR: &str = "MINIO_ENDPOINT";
pub const ACCESS_KEY_VAR: &str = "MINIO_ACCESS_KEY";
pub const SECRET_KEY_VAR: &str = "MINIO_SECRET_KEY";
pub const SECURE_VAR: &str = "MINIO_SECURE";
pub const REGION_VAR: &str = "MINIO_REGION";

// Zero-configuration defaults for a local development engine. Not for production use.
pub const DEFAULT_ENDPOINT: &str = "minio:9000";
pub const DEFAULT_ACCESS_KEY: &str = "minioadmin";
pub const DEFAULT_SECRET_KEY: &str = "minioadmin";
pub const DEFAULT_REGION: &str = "us-east-1";

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**********)")
    }
}

/// Connection settings for the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// `host:port`, or a full URL with scheme
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: SecretKey,
    /// Use TLS when the endpoint has no scheme
    pub secure: bool,
    pub region: String,
}

/// Explicitly supplied values; anything left `None` is looked up in the
/// environment and then defaulted.
#[derive(Debug, Clone, Default)]
pub struct StorageOverrides {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub secure: Option<bool>,
    pub region: Option<String>,
}

impl StorageConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: StorageOverrides) -> Self {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve field by field: explicit value, then `lookup(VAR)`, then the default.
    ///
    /// Never fails. A TLS flag that doesn't parse as an integer is ignored.
    pub fn resolve_with(
        overrides: StorageOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let field = |explicit: Option<String>, var: &str, default: &str| {
            explicit
                .or_else(|| lookup(var))
                .unwrap_or_else(|| default.to_string())
        };

        let secure = overrides.secure.unwrap_or_else(|| match lookup(SECURE_VAR) {
            None => false,
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                warn!(var = SECURE_VAR, value = %raw, "not an integer, assuming 0");
                false
            }),
        });

        Self {
            endpoint: field(overrides.endpoint, ENDPOINT_VAR, DEFAULT_ENDPOINT),
            access_key: field(overrides.access_key, ACCESS_KEY_VAR, DEFAULT_ACCESS_KEY),
            secret_key: SecretKey::new(field(
                overrides.secret_key,
                SECRET_KEY_VAR,
                DEFAULT_SECRET_KEY,
            )),
            secure,
            region: field(overrides.region, REGION_VAR, DEFAULT_REGION),
        }
    }

    /// The endpoint as a URL the S3 client can dial.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.secure {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::resolve_with(StorageOverrides::default(), |_| None)
    }
}

/// Integer-as-boolean: any non-zero integer is true.
fn parse_flag(raw: &str) -> Option<bool> {
    raw.trim().parse::<i64>().ok().map(|n| n != 0)
}

/// How the tool-invocation endpoint answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolTransport {
    /// Plain JSON response bodies
    #[default]
    Http,
    /// Responses wrapped in a server-sent event stream
    Sse,
}

impl FromStr for ToolTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "sse" => Ok(Self::Sse),
            other => Err(format!("unsupported transport: {other}")),
        }
    }
}

impl fmt::Display for ToolTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Sse => "sse",
        })
    }
}

/// Settings for the tool-invocation endpoint.
///
/// The default is enabled over HTTP; leaving the whole config out when
/// building the router keeps the endpoint unmounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTransportConfig {
    pub enabled: bool,
    pub transport: ToolTransport,
}

impl Default for ToolTransportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: ToolTransport::Http,
        }
    }
}

impl ToolTransportConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub storage: StorageConfig,
    pub health_timeout: Duration,
    pub tools: Option<ToolTransportConfig>,
    pub max_upload: Option<usize>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_input_resolves_to_defaults() {
        let config = StorageConfig::resolve_with(StorageOverrides::default(), env(&[]));
        assert_eq!(config.endpoint, "minio:9000");
        assert_eq!(config.access_key, "minioadmin");
        assert_eq!(config.secret_key.expose(), "minioadmin");
        assert!(!config.secure);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config, StorageConfig::default());
    }

    #[test]
    fn environment_fills_missing_fields() {
        let config = StorageConfig::resolve_with(
            StorageOverrides::default(),
            env(&[
                ("MINIO_ENDPOINT", "localhost:9100"),
                ("MINIO_SECRET_KEY", "hunter2"),
                ("MINIO_SECURE", "1"),
            ]),
        );
        assert_eq!(config.endpoint, "localhost:9100");
        assert_eq!(config.access_key, "minioadmin");
        assert_eq!(config.secret_key.expose(), "hunter2");
        assert!(config.secure);
    }

    #[test]
    fn explicit_values_beat_environment() {
        let config = StorageConfig::resolve_with(
            StorageOverrides {
                endpoint: Some("storage.internal:443".into()),
                secure: Some(false),
                ..Default::default()
            },
            env(&[("MINIO_ENDPOINT", "ignored:1"), ("MINIO_SECURE", "1")]),
        );
        assert_eq!(config.endpoint, "storage.internal:443");
        assert!(!config.secure);
    }

    #[test]
    fn secure_flag_is_integer_coerced() {
        let resolve = |raw: &str| {
            StorageConfig::resolve_with(
                StorageOverrides::default(),
                env(&[("MINIO_SECURE", raw)]),
            )
            .secure
        };
        assert!(!resolve("0"));
        assert!(resolve("1"));
        assert!(resolve("2"));
        assert!(!resolve("yes"));
    }

    #[test]
    fn endpoint_url_follows_tls_flag() {
        let mut config = StorageConfig::default();
        assert_eq!(config.endpoint_url(), "http://minio:9000");
        config.secure = true;
        assert_eq!(config.endpoint_url(), "https://minio:9000");
        config.endpoint = "http://127.0.0.1:9000".into();
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let config = StorageConfig::resolve_with(
            StorageOverrides {
                secret_key: Some("topsecret".into()),
                ..Default::default()
            },
            env(&[]),
        );
        let printed = format!("{config:?}");
        assert!(!printed.contains("topsecret"), "{printed}");
        assert!(printed.contains("SecretKey(**********)"));
    }

    #[test]
    fn tool_transport_defaults_to_enabled_http() {
        let config = ToolTransportConfig::default();
        assert!(config.enabled);
        assert_eq!(config.transport, ToolTransport::Http);
        assert!(!ToolTransportConfig::disabled().enabled);
        assert_eq!("sse".parse::<ToolTransport>(), Ok(ToolTransport::Sse));
        assert!("grpc".parse::<ToolTransport>().is_err());
    }

    #[test]
    fn tool_transport_display_parses_back() {
        // clap renders the default with Display and reads it back with FromStr
        for transport in [ToolTransport::Http, ToolTransport::Sse] {
            assert_eq!(transport.to_string().parse::<ToolTransport>(), Ok(transport));
        }
    }
}

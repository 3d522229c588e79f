//! Connection configuration for the probe.
//!
//! The security and durability policy is fixed; only the bootstrap servers, the
//! credentials and a set of additional client properties come from the user.

use crate::credentials::{Credentials, Secret};
use crate::error::ProbeError;
use rdkafka::ClientConfig;
use rdkafka::error::KafkaError;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Security protocol used for every connection.
pub const SECURITY_PROTOCOL: &str = "SASL_SSL";
/// SASL mechanism used for every connection.
pub const SASL_MECHANISM: &str = "PLAIN";
/// Acknowledgement policy of the producer.
pub const ACKS: &str = "all";
/// Idempotent producer flag.
pub const ENABLE_IDEMPOTENCE: bool = true;
/// Compression codec of the producer.
pub const COMPRESSION_TYPE: &str = "snappy";

// Keys owned by the probe itself, including librdkafka aliases.
const RESERVED_KEYS: &[&str] = &[
    "bootstrap.servers",
    "metadata.broker.list",
    "security.protocol",
    "sasl.mechanism",
    "sasl.mechanisms",
    "sasl.username",
    "sasl.password",
    "acks",
    "request.required.acks",
    "enable.idempotence",
    "compression.type",
    "compression.codec",
];

/// Client configuration assembled from the user's credentials.
#[derive(Clone)]
pub struct ConnectionConfig {
    bootstrap_servers: String,
    username: String,
    password: Secret,
    additional: Vec<(String, String)>,
}

impl ConnectionConfig {
    /// Creates the configuration after checking the bootstrap server syntax.
    pub fn new(credentials: &Credentials) -> Result<Self, ProbeError> {
        parse_bootstrap_servers(credentials.broker())?;

        Ok(Self {
            bootstrap_servers: credentials.broker().to_string(),
            username: credentials.username().to_string(),
            password: credentials.password().clone(),
            additional: Vec::new(),
        })
    }

    /// Adds extra client properties. Keys that belong to the fixed policy or
    /// to the credentials are rejected.
    pub fn with_properties(
        mut self,
        properties: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ProbeError> {
        for (key, value) in properties {
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(ProbeError::Configuration {
                    parameter: key,
                    message: "this property is set by the probe and cannot be overridden"
                        .to_string(),
                });
            }
            self.additional.push((key, value));
        }
        Ok(self)
    }

    pub fn bootstrap_servers(&self) -> &str {
        &self.bootstrap_servers
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub const fn password(&self) -> &Secret {
        &self.password
    }

    pub const fn security_protocol(&self) -> &'static str {
        SECURITY_PROTOCOL
    }

    pub const fn sasl_mechanism(&self) -> &'static str {
        SASL_MECHANISM
    }

    pub const fn acks(&self) -> &'static str {
        ACKS
    }

    pub const fn enable_idempotence(&self) -> bool {
        ENABLE_IDEMPOTENCE
    }

    pub const fn compression_type(&self) -> &'static str {
        COMPRESSION_TYPE
    }

    /// Extra properties in the order they were supplied.
    pub fn additional_properties(&self) -> &[(String, String)] {
        &self.additional
    }

    /// Host and port of every bootstrap server.
    pub fn bootstrap_addresses(&self) -> Vec<(String, u16)> {
        // Syntax was checked in `new`.
        parse_bootstrap_servers(&self.bootstrap_servers).unwrap_or_default()
    }

    /// Every property handed to the client library, secrets included.
    pub fn properties(&self) -> Vec<(String, String)> {
        let mut properties = vec![
            ("bootstrap.servers".to_string(), self.bootstrap_servers.clone()),
            ("security.protocol".to_string(), SECURITY_PROTOCOL.to_string()),
            ("sasl.mechanism".to_string(), SASL_MECHANISM.to_string()),
            ("sasl.username".to_string(), self.username.clone()),
            ("sasl.password".to_string(), self.password.expose().to_string()),
            ("acks".to_string(), ACKS.to_string()),
            ("enable.idempotence".to_string(), ENABLE_IDEMPOTENCE.to_string()),
            ("compression.type".to_string(), COMPRESSION_TYPE.to_string()),
        ];
        properties.extend(self.additional.iter().cloned());
        properties
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::from_iter(self.properties())
    }

    /// Lets the client library check every property without creating a client.
    pub fn validate(&self) -> Result<(), ProbeError> {
        match self.client_config().create_native_config() {
            Ok(_) => Ok(()),
            Err(KafkaError::ClientConfig(_, description, key, _)) => {
                Err(ProbeError::Configuration {
                    parameter: key,
                    message: description,
                })
            }
            Err(err) => Err(ProbeError::UnexpectedConfiguration {
                message: err.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let additional: Vec<(&str, &str)> = self
            .additional
            .iter()
            .map(|(key, value)| (key.as_str(), display_value(key, value)))
            .collect();

        f.debug_struct("ConnectionConfig")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("additional", &additional)
            .finish()
    }
}

// librdkafka properties carrying key material or credentials without saying
// so in their name.
const SENSITIVE_KEYS: &[&str] = &[
    "ssl.key.pem",
    "ssl_key",
    "ssl.keystore.password",
    "ssl.certificate.pem",
    "ssl_certificate",
    "sasl.oauthbearer.config",
    "sasl.oauthbearer.client.secret",
];

/// Whether a property value must be masked in output.
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&key.as_str()) || key.contains("password") || key.contains("secret")
}

/// Value as it may appear in diagnostic output.
pub fn display_value<'a>(key: &str, value: &'a str) -> &'a str {
    if is_sensitive_key(key) {
        Secret::redacted()
    } else {
        value
    }
}

/// Configuration stage of a probe run: builds, extends and validates the
/// configuration without touching the network.
pub fn build_config(
    credentials: &Credentials,
    properties_file: Option<&Path>,
) -> Result<ConnectionConfig, ProbeError> {
    let mut config = ConnectionConfig::new(credentials)?;

    if let Some(path) = properties_file {
        config = config.with_properties(load_properties_file(path)?)?;
    }

    config.validate()?;

    debug!(config = ?config, "Connection configuration validated");
    Ok(config)
}

/// Reads `key=value` client properties, skipping blank lines and `#` comments.
pub fn load_properties_file(path: &Path) -> Result<Vec<(String, String)>, ProbeError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ProbeError::UnexpectedConfiguration {
            message: format!("failed to read {}: {err}", path.display()),
        })?;

    let properties = parse_properties(&contents);

    info!(
        path = %path.display(),
        keys = ?properties.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
        "Loaded additional client properties"
    );

    Ok(properties)
}

fn parse_properties(contents: &str) -> Vec<(String, String)> {
    let mut properties = Vec::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            properties.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    properties
}

fn parse_bootstrap_servers(servers: &str) -> Result<Vec<(String, u16)>, ProbeError> {
    servers
        .split(',')
        .map(|entry| {
            parse_bootstrap_entry(entry.trim()).map_err(|message| ProbeError::Configuration {
                parameter: "bootstrap.servers".to_string(),
                message,
            })
        })
        .collect()
}

fn parse_bootstrap_entry(entry: &str) -> Result<(String, u16), String> {
    if entry.is_empty() {
        return Err("empty broker address in list".to_string());
    }

    let address = entry.split_once("://").map_or(entry, |(_, rest)| rest);
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("'{entry}' is not in host:port form"))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(format!("'{entry}' has an invalid host"));
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| format!("'{entry}' has an invalid port"))?;

    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn credentials(broker: &str) -> Credentials {
        Credentials::from_flags(
            Some(broker.to_string()),
            Some("alice".to_string()),
            Some("secret".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_fixed_policy_values() {
        let config = ConnectionConfig::new(&credentials("localhost:9092")).unwrap();

        assert_eq!(config.bootstrap_servers(), "localhost:9092");
        assert_eq!(config.username(), "alice");
        assert_eq!(config.password().expose(), "secret");
        assert_eq!(config.security_protocol(), "SASL_SSL");
        assert_eq!(config.sasl_mechanism(), "PLAIN");
        assert_eq!(config.acks(), "all");
        assert!(config.enable_idempotence());
        assert_eq!(config.compression_type(), "snappy");
        assert!(config.additional_properties().is_empty());
    }

    #[test]
    fn test_client_config_carries_every_property() {
        let config = ConnectionConfig::new(&credentials("localhost:9092")).unwrap();
        let client_config = config.client_config();

        assert_eq!(client_config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(client_config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(client_config.get("sasl.mechanism"), Some("PLAIN"));
        assert_eq!(client_config.get("sasl.username"), Some("alice"));
        assert_eq!(client_config.get("sasl.password"), Some("secret"));
        assert_eq!(client_config.get("acks"), Some("all"));
        assert_eq!(client_config.get("enable.idempotence"), Some("true"));
        assert_eq!(client_config.get("compression.type"), Some("snappy"));
    }

    #[test]
    fn test_bootstrap_syntax() {
        assert!(ConnectionConfig::new(&credentials("a:9092, b:9093")).is_ok());
        assert!(ConnectionConfig::new(&credentials("SASL_SSL://a:9092")).is_ok());
        assert!(ConnectionConfig::new(&credentials("[::1]:9092")).is_ok());

        for broker in ["localhost", "localhost:0", "localhost:port", ":9092", "a:9092,,b:9092"] {
            let err = ConnectionConfig::new(&credentials(broker)).unwrap_err();
            match err {
                ProbeError::Configuration { parameter, .. } => {
                    assert_eq!(parameter, "bootstrap.servers", "broker {broker}")
                }
                other => panic!("unexpected error for {broker}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_bootstrap_addresses() {
        let config = ConnectionConfig::new(&credentials("a:9092,SSL://b:9093")).unwrap();
        assert_eq!(
            config.bootstrap_addresses(),
            vec![("a".to_string(), 9092), ("b".to_string(), 9093)]
        );
    }

    #[test]
    fn test_reserved_properties_rejected() {
        let config = ConnectionConfig::new(&credentials("localhost:9092")).unwrap();
        let err = config
            .with_properties(vec![("security.protocol".to_string(), "plaintext".to_string())])
            .unwrap_err();

        assert_eq!(
            err,
            ProbeError::Configuration {
                parameter: "security.protocol".to_string(),
                message: "this property is set by the probe and cannot be overridden".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_rejects_unknown_property() {
        let config = ConnectionConfig::new(&credentials("localhost:9092"))
            .unwrap()
            .with_properties(vec![("no.such.property".to_string(), "1".to_string())])
            .unwrap();

        match config.validate().unwrap_err() {
            ProbeError::Configuration { parameter, .. } => {
                assert_eq!(parameter, "no.such.property")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_fixed_policy() {
        let config = ConnectionConfig::new(&credentials("localhost:9092")).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ConnectionConfig::new(&credentials("localhost:9092"))
            .unwrap()
            .with_properties(vec![
                ("ssl.key.password".to_string(), "keypass".to_string()),
                ("ssl.key.pem".to_string(), "PRIVATEKEYMATERIAL".to_string()),
                ("client.id".to_string(), "probe".to_string()),
            ])
            .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("PRIVATEKEYMATERIAL"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("keypass"));
        assert!(debug.contains("probe"));
    }

    #[test]
    fn test_sensitive_keys() {
        for key in [
            "sasl.password",
            "ssl.key.password",
            "ssl.keystore.password",
            "ssl.key.pem",
            "SSL.KEY.PEM",
            "ssl_key",
            "ssl.certificate.pem",
            "sasl.oauthbearer.config",
            "sasl.oauthbearer.client.secret",
        ] {
            assert!(is_sensitive_key(key), "{key} should be masked");
        }
        for key in ["client.id", "ssl.ca.location", "linger.ms"] {
            assert!(!is_sensitive_key(key), "{key} should be shown");
        }
        assert_eq!(display_value("ssl.key.pem", "-----BEGIN"), "********");
        assert_eq!(display_value("client.id", "probe"), "probe");
    }

    #[test]
    fn test_load_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "client.id = probe").unwrap();
        writeln!(file, "ssl.ca.location=/etc/ssl/ca.pem").unwrap();
        writeln!(file, "not a property").unwrap();

        let properties = load_properties_file(file.path()).unwrap();
        assert_eq!(
            properties,
            vec![
                ("client.id".to_string(), "probe".to_string()),
                ("ssl.ca.location".to_string(), "/etc/ssl/ca.pem".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_properties_file_is_unexpected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_properties_file(&dir.path().join("missing.properties")).unwrap_err();
        assert!(matches!(err, ProbeError::UnexpectedConfiguration { .. }));
    }

    #[test]
    fn test_build_config_with_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client.id=probe").unwrap();

        let config = build_config(&credentials("localhost:9092"), Some(file.path())).unwrap();
        assert_eq!(
            config.additional_properties(),
            &[("client.id".to_string(), "probe".to_string())]
        );
    }
}

use rdkafka::error::RDKafkaErrorCode;
use std::io;
use std::time::Duration;

/// Errors that can end a probe run, one variant per failure category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// A configuration value was rejected
    Configuration { parameter: String, message: String },
    /// Configuration could not be assembled for any other reason
    UnexpectedConfiguration { message: String },
    /// Producing a message failed
    Produce {
        code: RDKafkaErrorCode,
        reason: String,
        fatal: bool,
    },
    /// General error reported by the client library or a broker
    Broker {
        code: RDKafkaErrorCode,
        reason: String,
        fatal: bool,
    },
    /// The client was used in a state it does not support
    InvalidOperation { message: String },
    /// Socket-level failure before the client got involved
    Network { kind: io::ErrorKind, message: String },
    /// A bounded operation exceeded its deadline
    Timeout { operation: String, after: Duration },
    /// The broker denied access
    Authorization { message: String },
    /// Anything not covered above
    Unexpected { message: String },
}

impl ProbeError {
    /// Whether the error was raised while assembling the configuration.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::UnexpectedConfiguration { .. }
        )
    }

    /// Fatal flag as reported by the client library.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Produce { fatal, .. } | Self::Broker { fatal, .. } => *fatal,
            _ => false,
        }
    }

    /// Guidance printed under the error.
    pub fn hint(&self) -> String {
        match self {
            Self::Configuration { .. } => {
                "Fix the rejected value and run the probe again.".to_string()
            }
            Self::UnexpectedConfiguration { .. } => {
                "Check the properties file and the supplied options.".to_string()
            }
            Self::Produce { .. } => {
                "The producer could not deliver a message. Check topic permissions and broker health."
                    .to_string()
            }
            Self::Broker { code, .. } => broker_hint(*code),
            Self::InvalidOperation { .. } => {
                "This may indicate an issue with the producer configuration or state.".to_string()
            }
            Self::Network { .. } => {
                "Please verify the broker URL and ensure the network is accessible.".to_string()
            }
            Self::Timeout { .. } => {
                "The broker may be unreachable or not responding. Check the broker URL and network connectivity."
                    .to_string()
            }
            Self::Authorization { .. } => "Check your credentials and permissions.".to_string(),
            Self::Unexpected { .. } => {
                "Re-run with --log-level debug for client library diagnostics.".to_string()
            }
        }
    }
}

/// Hint for the broker category, keyed on the finer-grained library code.
pub fn broker_hint(code: RDKafkaErrorCode) -> String {
    match code {
        RDKafkaErrorCode::Authentication => {
            "Authentication failed. Please verify your username and password.".to_string()
        }
        RDKafkaErrorCode::AllBrokersDown => {
            "Cannot connect to any brokers. Please verify the bootstrap servers URL.".to_string()
        }
        RDKafkaErrorCode::BrokerTransportFailure => {
            "Network transport error. Check your network connection and firewall settings."
                .to_string()
        }
        RDKafkaErrorCode::SaslAuthenticationFailed => {
            "SASL authentication failed. Check your credentials.".to_string()
        }
        RDKafkaErrorCode::OperationTimedOut => {
            "Connection timed out. The broker may be unreachable or overloaded.".to_string()
        }
        other => format!("Error Type: {other:?}"),
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { parameter, message } => {
                write!(f, "Invalid configuration parameter '{}': {}", parameter, message)
            }
            Self::UnexpectedConfiguration { message } => {
                write!(f, "Unexpected configuration error: {}", message)
            }
            Self::Produce { code, reason, .. } => {
                write!(f, "Produce failed ({:?}): {}", code, reason)
            }
            Self::Broker { code, reason, .. } => write!(f, "Kafka error ({:?}): {}", code, reason),
            Self::InvalidOperation { message } => write!(f, "Invalid operation: {}", message),
            Self::Network { kind, message } => write!(f, "Network error ({:?}): {}", kind, message),
            Self::Timeout { operation, after } => {
                write!(f, "{} timed out after {:?}", operation, after)
            }
            Self::Authorization { message } => write!(f, "Access denied: {}", message),
            Self::Unexpected { message } => write!(f, "Unexpected error: {}", message),
        }
    }
}

impl std::error::Error for ProbeError {}

//! rdkafka-backed connector.

use crate::config::ConnectionConfig;
use crate::error::ProbeError;
use crate::probe::{ClusterConnector, ClusterHandle};
use crate::types::ClusterMetadata;
use async_trait::async_trait;
use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, Producer};
use std::fmt::Debug;
use std::io;
use std::net::ToSocketAddrs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

// Headroom on top of the client library's own timeout before giving up on
// the blocking call.
const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// An error reported through the client's error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError {
    pub code: RDKafkaErrorCode,
    pub reason: String,
}

/// Client context that forwards librdkafka logs to `tracing` and keeps the
/// most recent error callback.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    last_error: Arc<Mutex<Option<RecordedError>>>,
}

impl ProbeContext {
    /// Removes and returns the most recently recorded error.
    pub fn take_last_error(&self) -> Option<RecordedError> {
        self.last_error.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl ClientContext for ProbeContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => {
                error!(target: "librdkafka", facility = fac, "{}", log_message)
            }
            RDKafkaLogLevel::Warning => warn!(target: "librdkafka", facility = fac, "{}", log_message),
            RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => {
                info!(target: "librdkafka", facility = fac, "{}", log_message)
            }
            RDKafkaLogLevel::Debug => debug!(target: "librdkafka", facility = fac, "{}", log_message),
        }
    }

    fn error(&self, error: KafkaError, reason: &str) {
        warn!(target: "librdkafka", error = %error, reason = reason, "Client error reported");

        if let Some(code) = error.rdkafka_error_code() {
            if let Ok(mut slot) = self.last_error.lock() {
                *slot = Some(RecordedError {
                    code,
                    reason: reason.to_string(),
                });
            }
        }
    }
}

/// Creates [`KafkaClusterHandle`]s backed by a [`FutureProducer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaConnector;

impl ClusterConnector for KafkaConnector {
    type Handle = KafkaClusterHandle;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Handle, ProbeError> {
        resolve_bootstrap(&config.bootstrap_addresses())?;

        let context = ProbeContext::default();
        let producer: FutureProducer<ProbeContext> = config
            .client_config()
            .create_with_context(context.clone())
            .map_err(|err| classify(err, None))?;

        info!(
            bootstrap_servers = %config.bootstrap_servers(),
            username = %config.username(),
            "Kafka producer created"
        );

        Ok(KafkaClusterHandle {
            producer: Arc::new(producer),
            context,
        })
    }
}

/// Producer handle used for the metadata request and the final flush.
pub struct KafkaClusterHandle {
    producer: Arc<FutureProducer<ProbeContext>>,
    context: ProbeContext,
}

impl Debug for KafkaClusterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KafkaClusterHandle")
    }
}

#[async_trait]
impl ClusterHandle for KafkaClusterHandle {
    async fn fetch_metadata(&self, timeout: Duration) -> Result<ClusterMetadata, ProbeError> {
        let producer = Arc::clone(&self.producer);
        let request = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, timeout)
                .map(|metadata| ClusterMetadata::from(&metadata))
        });

        match tokio::time::timeout(timeout + DEADLINE_GRACE, request).await {
            Ok(Ok(Ok(metadata))) => Ok(metadata),
            Ok(Ok(Err(err))) => Err(classify(err, self.context.take_last_error())),
            Ok(Err(join_err)) => Err(ProbeError::Unexpected {
                message: format!("metadata request task failed: {join_err}"),
            }),
            Err(_) => Err(ProbeError::Timeout {
                operation: "Metadata request".to_string(),
                after: timeout,
            }),
        }
    }

    fn flush(&self, timeout: Duration) -> Result<(), ProbeError> {
        trace!(timeout = ?timeout, "Flushing producer");
        self.producer
            .flush(timeout)
            .map_err(|err| classify(err, self.context.take_last_error()))
    }
}

/// Maps a client library error onto a failure category.
///
/// A bare "timed out" hides the real cause, which librdkafka reports through the
/// error callback; when one was recorded it replaces the timeout.
pub fn classify(err: KafkaError, recorded: Option<RecordedError>) -> ProbeError {
    match err {
        KafkaError::ClientConfig(_, description, key, _) => ProbeError::Configuration {
            parameter: key,
            message: description,
        },
        KafkaError::ClientCreation(message) => ProbeError::InvalidOperation { message },
        KafkaError::MessageProduction(code) => ProbeError::Produce {
            code,
            reason: code.to_string(),
            fatal: code == RDKafkaErrorCode::Fatal,
        },
        KafkaError::MetadataFetch(code) | KafkaError::Flush(code) | KafkaError::Global(code) => {
            from_code(code, recorded)
        }
        other => match other.rdkafka_error_code() {
            Some(code) => from_code(code, recorded),
            None => ProbeError::Unexpected {
                message: other.to_string(),
            },
        },
    }
}

fn from_code(code: RDKafkaErrorCode, recorded: Option<RecordedError>) -> ProbeError {
    let (code, reason) = match recorded {
        Some(recorded) if code == RDKafkaErrorCode::OperationTimedOut => {
            (recorded.code, recorded.reason)
        }
        _ => (code, code.to_string()),
    };

    match code {
        RDKafkaErrorCode::TopicAuthorizationFailed
        | RDKafkaErrorCode::GroupAuthorizationFailed
        | RDKafkaErrorCode::ClusterAuthorizationFailed
        | RDKafkaErrorCode::TransactionalIdAuthorizationFailed => {
            ProbeError::Authorization { message: reason }
        }
        code => ProbeError::Broker {
            code,
            reason,
            fatal: code == RDKafkaErrorCode::Fatal,
        },
    }
}

/// Fails with a network error when none of the bootstrap hosts resolves.
pub fn resolve_bootstrap(addresses: &[(String, u16)]) -> Result<(), ProbeError> {
    let mut last_error: Option<io::Error> = None;

    for (host, port) in addresses {
        match (host.as_str(), *port).to_socket_addrs() {
            Ok(mut resolved) => {
                if resolved.next().is_some() {
                    return Ok(());
                }
                last_error = Some(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{host}:{port} resolved to no addresses"),
                ));
            }
            Err(err) => {
                debug!(host = %host, port = port, error = %err, "Bootstrap host did not resolve");
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) => Err(ProbeError::Network {
            kind: err.kind(),
            message: err.to_string(),
        }),
        None => Ok(()),
    }
}

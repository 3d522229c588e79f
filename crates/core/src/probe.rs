//! The probe run: configuration, connection, report and cleanup.

use crate::config::{ConnectionConfig, build_config};
use crate::credentials::Credentials;
use crate::error::ProbeError;
use crate::report::Reporter;
use crate::types::ClusterMetadata;
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default bound for the metadata request.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);
/// Default bound for the final flush.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates connection handles. The only seam that touches the network.
pub trait ClusterConnector {
    type Handle: ClusterHandle;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Handle, ProbeError>;
}

/// An open producer handle.
#[async_trait]
pub trait ClusterHandle: Send + Sync {
    async fn fetch_metadata(&self, timeout: Duration) -> Result<ClusterMetadata, ProbeError>;

    fn flush(&self, timeout: Duration) -> Result<(), ProbeError>;
}

/// Knobs of a probe run that do not come from the credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub metadata_timeout: Duration,
    pub flush_timeout: Duration,
    /// Extra client properties in `key=value` form
    pub properties_file: Option<PathBuf>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            properties_file: None,
        }
    }
}

/// How a probe run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Connected(ClusterMetadata),
    /// Stopped before a handle was created
    ConfigurationFailed(ProbeError),
    ConnectionFailed(ProbeError),
}

impl ProbeOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Owns the connection handle for the whole run and releases it exactly once.
///
/// [`HandleGuard::release`] is the normal path and reports the result; if the
/// guard is dropped without it (an early return) the handle is flushed and
/// released silently.
#[derive(Debug)]
pub struct HandleGuard<H: ClusterHandle> {
    handle: Option<H>,
    flush_timeout: Duration,
}

impl<H: ClusterHandle> HandleGuard<H> {
    pub const fn empty(flush_timeout: Duration) -> Self {
        Self {
            handle: None,
            flush_timeout,
        }
    }

    /// Takes ownership of a freshly created handle.
    pub fn hold(&mut self, handle: H) -> &H {
        self.handle.insert(handle)
    }

    pub const fn is_holding(&self) -> bool {
        self.handle.is_some()
    }

    /// Flushes and drops the handle. A guard that never held one releases nothing
    /// and prints nothing.
    pub fn release<W: Write>(mut self, reporter: &mut Reporter<W>) -> io::Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        reporter.section("Cleaning up")?;
        let flushed = handle.flush(self.flush_timeout);
        drop(handle);

        match flushed {
            Ok(()) => {
                info!("Producer flushed and released");
                reporter.cleanup_done()
            }
            Err(err) => {
                warn!(error = %err, "Producer released with unflushed messages");
                reporter.cleanup_flush_failed(&err)
            }
        }
    }
}

impl<H: ClusterHandle> Drop for HandleGuard<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.flush(self.flush_timeout) {
                warn!(error = %err, "Producer released with unflushed messages");
            }
        }
    }
}

/// Runs one probe and writes the transcript to `reporter`.
///
/// Only output failures are returned as errors; every probe failure is
/// reported and folded into the [`ProbeOutcome`].
pub async fn run_probe<C, W>(
    connector: &C,
    credentials: &Credentials,
    settings: &ProbeSettings,
    reporter: &mut Reporter<W>,
) -> io::Result<ProbeOutcome>
where
    C: ClusterConnector,
    W: Write,
{
    reporter.section("Creating Producer Configuration")?;

    let config = match build_config(credentials, settings.properties_file.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to build connection configuration");
            reporter.failure(&err)?;
            return Ok(ProbeOutcome::ConfigurationFailed(err));
        }
    };
    reporter.config_created(&config)?;

    let mut guard = HandleGuard::empty(settings.flush_timeout);
    // An output error here drops the guard, which still releases the handle.
    let result = connect_and_fetch(connector, &config, settings, &mut guard, reporter).await?;

    let outcome = match result {
        Ok(metadata) => {
            info!(
                brokers = metadata.brokers.len(),
                topics = metadata.topic_count,
                "Connected to cluster"
            );
            reporter.connected(&metadata)?;
            ProbeOutcome::Connected(metadata)
        }
        Err(err) => {
            error!(error = %err, fatal = err.is_fatal(), "Connection attempt failed");
            debug!(error = ?err, "Connection failure details");
            reporter.failure(&err)?;
            ProbeOutcome::ConnectionFailed(err)
        }
    };

    guard.release(reporter)?;
    Ok(outcome)
}

async fn connect_and_fetch<C, W>(
    connector: &C,
    config: &ConnectionConfig,
    settings: &ProbeSettings,
    guard: &mut HandleGuard<C::Handle>,
    reporter: &mut Reporter<W>,
) -> io::Result<Result<ClusterMetadata, ProbeError>>
where
    C: ClusterConnector,
    W: Write,
{
    reporter.section("Building Kafka Producer")?;

    let handle = match connector.connect(config) {
        Ok(handle) => guard.hold(handle),
        Err(err) => return Ok(Err(err)),
    };
    reporter.producer_built()?;

    reporter.section("Testing Connection")?;
    info!(
        bootstrap_servers = %config.bootstrap_servers(),
        timeout = ?settings.metadata_timeout,
        "Requesting cluster metadata"
    );

    Ok(handle.fetch_metadata(settings.metadata_timeout).await)
}

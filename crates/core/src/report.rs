//! Human-readable probe output.
//!
//! Everything the probe has to say goes through one writer so binaries print to
//! stdout and tests capture into a buffer.

use crate::config::{ConnectionConfig, display_value};
use crate::credentials::{CredentialError, Secret};
use crate::error::ProbeError;
use crate::types::ClusterMetadata;
use std::io::{self, Write};

/// Writes the probe transcript.
#[derive(Debug)]
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "=== Kafka SASL/SSL Connectivity Probe ===")
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n--- {title} ---")
    }

    /// Prints text verbatim, used for help and version output.
    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text.trim_end())
    }

    pub fn credential_error(&mut self, err: &CredentialError) -> io::Result<()> {
        writeln!(self.out, "Error: {err}")?;
        if matches!(err, CredentialError::Missing(_)) {
            writeln!(self.out, "Use --help for usage information.")?;
        }
        Ok(())
    }

    /// Echoes the configuration with secrets masked.
    pub fn config_created(&mut self, config: &ConnectionConfig) -> io::Result<()> {
        writeln!(self.out, "✓ Producer configuration created successfully")?;
        writeln!(self.out, "  Bootstrap Servers: {}", config.bootstrap_servers())?;
        writeln!(self.out, "  Security Protocol: {}", config.security_protocol())?;
        writeln!(self.out, "  SASL Mechanism: {}", config.sasl_mechanism())?;
        writeln!(self.out, "  Username: {}", config.username())?;
        writeln!(self.out, "  Password: {}", Secret::redacted())?;
        writeln!(self.out, "  Acks: {}", config.acks())?;
        writeln!(self.out, "  Enable Idempotence: {}", config.enable_idempotence())?;
        writeln!(self.out, "  Compression Type: {}", config.compression_type())?;
        for (key, value) in config.additional_properties() {
            writeln!(self.out, "  {key}: {}", display_value(key, value))?;
        }
        Ok(())
    }

    pub fn producer_built(&mut self) -> io::Result<()> {
        writeln!(self.out, "✓ Kafka producer built successfully")
    }

    pub fn connected(&mut self, metadata: &ClusterMetadata) -> io::Result<()> {
        writeln!(self.out, "✓ Successfully connected to Kafka cluster!")?;
        writeln!(
            self.out,
            "  Originating Broker: {} ({})",
            metadata.originating_broker_id, metadata.originating_broker_name
        )?;
        writeln!(self.out, "  Brokers: {}", metadata.brokers.len())?;
        for broker in &metadata.brokers {
            writeln!(
                self.out,
                "    - Broker {}: {}:{}",
                broker.id, broker.host, broker.port
            )?;
        }
        writeln!(self.out, "  Topics: {}", metadata.topic_count)
    }

    /// Prints the category block for a failed run.
    pub fn failure(&mut self, err: &ProbeError) -> io::Result<()> {
        match err {
            ProbeError::Configuration { parameter, message } => {
                writeln!(self.out, "✗ Configuration Error: Invalid configuration parameter")?;
                writeln!(self.out, "  Parameter: {parameter}")?;
                writeln!(self.out, "  Message: {message}")?;
            }
            ProbeError::UnexpectedConfiguration { message } => {
                writeln!(self.out, "✗ Unexpected Error during configuration")?;
                writeln!(self.out, "  Message: {message}")?;
            }
            ProbeError::Produce {
                code,
                reason,
                fatal,
            } => {
                writeln!(self.out, "✗ Producer Error: Failed to produce message")?;
                writeln!(self.out, "  Error Code: {code:?}")?;
                writeln!(self.out, "  Error Reason: {reason}")?;
                writeln!(self.out, "  Is Fatal: {fatal}")?;
            }
            ProbeError::Broker {
                code,
                reason,
                fatal,
            } => {
                writeln!(self.out, "✗ Kafka Error: {code:?}")?;
                writeln!(self.out, "  Reason: {reason}")?;
                writeln!(self.out, "  Is Fatal: {fatal}")?;
            }
            ProbeError::InvalidOperation { message } => {
                writeln!(self.out, "✗ Invalid Operation: {message}")?;
            }
            ProbeError::Network { kind, message } => {
                writeln!(self.out, "✗ Network Error: Failed to establish socket connection")?;
                writeln!(self.out, "  Error Code: {kind:?}")?;
                writeln!(self.out, "  Message: {message}")?;
            }
            ProbeError::Timeout { .. } => {
                writeln!(self.out, "✗ Timeout Error: Operation timed out")?;
                writeln!(self.out, "  Message: {err}")?;
            }
            ProbeError::Authorization { message } => {
                writeln!(self.out, "✗ Authorization Error: Access denied")?;
                writeln!(self.out, "  Message: {message}")?;
            }
            ProbeError::Unexpected { message } => {
                writeln!(self.out, "✗ Unexpected Error")?;
                writeln!(self.out, "  Message: {message}")?;
            }
        }
        writeln!(self.out, "\n  → {}", err.hint())
    }

    pub fn cleanup_done(&mut self) -> io::Result<()> {
        writeln!(self.out, "✓ Producer disposed successfully")
    }

    pub fn cleanup_flush_failed(&mut self, err: &ProbeError) -> io::Result<()> {
        writeln!(self.out, "✗ Pending messages were not flushed: {err}")?;
        writeln!(self.out, "✓ Producer disposed")
    }
}

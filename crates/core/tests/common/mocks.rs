/// Reusable mock implementations for testing
use async_trait::async_trait;
use sasl_probe_core::{ClusterConnector, ClusterHandle, ClusterMetadata, ConnectionConfig, ProbeError};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What happened to the handles a [`MockConnector`] gave out
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HandleEvents {
    pub connects: usize,
    pub fetches: Vec<Duration>,
    pub flushes: Vec<Duration>,
    pub drops: usize,
    pub bootstrap_servers: Vec<String>,
}

/// Mock connector with scripted connect, metadata and flush results
#[derive(Clone)]
pub struct MockConnector {
    connect_error: Option<ProbeError>,
    metadata: Result<ClusterMetadata, ProbeError>,
    flush_error: Option<ProbeError>,
    events: Arc<Mutex<HandleEvents>>,
}

impl MockConnector {
    pub fn returning(metadata: ClusterMetadata) -> Self {
        Self {
            connect_error: None,
            metadata: Ok(metadata),
            flush_error: None,
            events: Arc::new(Mutex::new(HandleEvents::default())),
        }
    }

    pub fn failing_connect(error: ProbeError) -> Self {
        let mut connector = Self::returning(super::three_broker_cluster());
        connector.connect_error = Some(error);
        connector
    }

    pub fn failing_fetch(error: ProbeError) -> Self {
        let mut connector = Self::returning(super::three_broker_cluster());
        connector.metadata = Err(error);
        connector
    }

    pub fn with_flush_error(mut self, error: ProbeError) -> Self {
        self.flush_error = Some(error);
        self
    }

    pub fn events(&self) -> HandleEvents {
        self.events.lock().unwrap().clone()
    }
}

impl ClusterConnector for MockConnector {
    type Handle = MockHandle;

    fn connect(&self, config: &ConnectionConfig) -> Result<MockHandle, ProbeError> {
        {
            let mut events = self.events.lock().unwrap();
            events.connects += 1;
            events
                .bootstrap_servers
                .push(config.bootstrap_servers().to_string());
        }

        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }

        Ok(MockHandle {
            metadata: self.metadata.clone(),
            flush_error: self.flush_error.clone(),
            events: Arc::clone(&self.events),
        })
    }
}

pub struct MockHandle {
    metadata: Result<ClusterMetadata, ProbeError>,
    flush_error: Option<ProbeError>,
    events: Arc<Mutex<HandleEvents>>,
}

#[async_trait]
impl ClusterHandle for MockHandle {
    async fn fetch_metadata(&self, timeout: Duration) -> Result<ClusterMetadata, ProbeError> {
        self.events.lock().unwrap().fetches.push(timeout);
        self.metadata.clone()
    }

    fn flush(&self, timeout: Duration) -> Result<(), ProbeError> {
        self.events.lock().unwrap().flushes.push(timeout);
        match &self.flush_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if let Ok(mut events) = self.events.lock() {
            events.drops += 1;
        }
    }
}

/// Writer that fails once it is asked to write a chunk containing `marker`
pub struct FailingWriter {
    marker: &'static str,
    pub written: Vec<u8>,
}

impl FailingWriter {
    pub fn failing_at(marker: &'static str) -> Self {
        Self {
            marker,
            written: Vec::new(),
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if String::from_utf8_lossy(buf).contains(self.marker) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

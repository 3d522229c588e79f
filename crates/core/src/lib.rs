pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod kafka;
pub mod logger;
pub mod probe;
pub mod prompt;
pub mod report;
pub mod types;

pub use cli::{ArgsError, Invocation, ProbeOptions, parse_args};
pub use config::{ConnectionConfig, build_config};
pub use credentials::{CredentialError, Credentials, Field, Secret};
pub use error::ProbeError;
pub use kafka::KafkaConnector;
pub use probe::{
    ClusterConnector, ClusterHandle, HandleGuard, ProbeOutcome, ProbeSettings, run_probe,
};
pub use report::Reporter;
pub use types::{BrokerInfo, ClusterMetadata};

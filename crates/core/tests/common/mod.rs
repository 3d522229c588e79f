pub mod mocks;

use sasl_probe_core::{BrokerInfo, ClusterMetadata, Credentials};

pub fn credentials(broker: &str) -> Credentials {
    Credentials::from_flags(
        Some(broker.to_string()),
        Some("alice".to_string()),
        Some("secret".to_string()),
    )
    .unwrap()
}

pub fn three_broker_cluster() -> ClusterMetadata {
    ClusterMetadata {
        originating_broker_id: 2,
        originating_broker_name: "b2.example.com:9092/2".to_string(),
        brokers: (1..=3)
            .map(|id| BrokerInfo {
                id,
                host: format!("b{id}.example.com"),
                port: 9092,
            })
            .collect(),
        topic_count: 12,
    }
}

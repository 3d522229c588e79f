use rdkafka::metadata::Metadata;

/// A broker as advertised in the cluster metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

/// Snapshot of the cluster taken by a single metadata request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMetadata {
    /// Broker that answered the request
    pub originating_broker_id: i32,
    pub originating_broker_name: String,
    pub brokers: Vec<BrokerInfo>,
    pub topic_count: usize,
}

impl From<&Metadata> for ClusterMetadata {
    fn from(metadata: &Metadata) -> Self {
        Self {
            originating_broker_id: metadata.orig_broker_id(),
            originating_broker_name: metadata.orig_broker_name().to_string(),
            brokers: metadata
                .brokers()
                .iter()
                .map(|broker| BrokerInfo {
                    id: broker.id(),
                    host: broker.host().to_string(),
                    port: broker.port(),
                })
                .collect(),
            topic_count: metadata.topics().len(),
        }
    }
}

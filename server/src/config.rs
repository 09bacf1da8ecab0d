use clue_shared::WireFormat;
use std::time::Duration;

/// Runtime settings of the table server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Connections the hub accepts at once
    pub max_connections: usize,
    /// Capacity of the hub inbox
    pub hub_queue: usize,
    /// Capacity of each connection's outbound queue
    pub outbound_queue: usize,
    pub ping_period: Duration,
    /// Inbound silence after which a connection is considered dead
    pub pong_wait: Duration,
    pub write_wait: Duration,
    pub max_message_size: usize,
    pub max_games_per_user: usize,
    pub wire_format: WireFormat,
    /// Seeds the hub RNG for reproducible deals
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_connections: 256,
            hub_queue: 1024,
            outbound_queue: 64,
            ping_period: Duration::from_secs(55),
            pong_wait: Duration::from_secs(60),
            write_wait: Duration::from_secs(10),
            max_message_size: 1024,
            max_games_per_user: 10,
            wire_format: WireFormat::Json,
            seed: None,
        }
    }
}

use clap::Parser;
use clue_server::config::ServerConfig;
use clue_server::network::Server;
use clue_shared::WireFormat;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, env = "CLUE_HOST", default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, env = "CLUE_PORT", default_value = "8080")]
    port: u16,
    /// Maximum concurrent connections
    #[clap(long, env = "CLUE_MAX_CONNECTIONS", default_value = "256")]
    max_connections: usize,
    /// Capacity of the hub inbox
    #[clap(long, env = "CLUE_HUB_QUEUE", default_value = "1024")]
    hub_queue: usize,
    /// Capacity of each connection's outbound queue
    #[clap(long, env = "CLUE_OUTBOUND_QUEUE", default_value = "64")]
    outbound_queue: usize,
    /// Seconds between keepalive pings
    #[clap(long, env = "CLUE_PING_PERIOD_SECS", default_value = "55")]
    ping_period_secs: u64,
    /// Seconds of inbound silence before a connection is dropped
    #[clap(long, env = "CLUE_PONG_WAIT_SECS", default_value = "60")]
    pong_wait_secs: u64,
    /// Seconds a single write may take
    #[clap(long, env = "CLUE_WRITE_WAIT_SECS", default_value = "10")]
    write_wait_secs: u64,
    /// Largest inbound frame in bytes
    #[clap(long, env = "CLUE_MAX_MESSAGE_SIZE", default_value = "1024")]
    max_message_size: usize,
    /// Tables a single user may sit at
    #[clap(long, env = "CLUE_MAX_GAMES_PER_USER", default_value = "10")]
    max_games_per_user: usize,
    /// Frame encoding
    #[clap(long, env = "CLUE_WIRE_FORMAT", value_enum, default_value = "json")]
    wire_format: WireFormat,
    /// Seed for reproducible deals
    #[clap(long, env = "CLUE_SEED")]
    seed: Option<u64>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            bind_addr: format!("{}:{}", args.host, args.port),
            max_connections: args.max_connections,
            hub_queue: args.hub_queue,
            outbound_queue: args.outbound_queue,
            ping_period: Duration::from_secs(args.ping_period_secs),
            pong_wait: Duration::from_secs(args.pong_wait_secs),
            write_wait: Duration::from_secs(args.write_wait_secs),
            max_message_size: args.max_message_size,
            max_games_per_user: args.max_games_per_user,
            wire_format: args.wire_format,
            seed: args.seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    let server = Server::bind(config).await?;
    server.run().await
}

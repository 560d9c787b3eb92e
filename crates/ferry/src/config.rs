use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ferry_fetch::{DEFAULT_THROTTLE_RATE, ServiceConfig};

/// Command-line and environment configuration of the service.
#[derive(Debug, Clone, Parser)]
#[command(name = "ferry", version, about = "Fetch remote files in the background and serve them back")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "FERRY_LISTEN", default_value = "127.0.0.1:3003")]
    pub listen: SocketAddr,

    /// Directory downloaded files are stored in
    #[arg(long, env = "FERRY_STORAGE_DIR", default_value = "downloads")]
    pub storage_dir: PathBuf,

    /// Milliseconds to wait after a cancellation before deleting the partial file
    #[arg(long, env = "FERRY_CANCEL_GRACE_MS", default_value_t = 1000)]
    pub cancel_grace_ms: u64,

    /// Default bytes per second for /download-slow
    #[arg(long, env = "FERRY_THROTTLE_RATE", default_value_t = DEFAULT_THROTTLE_RATE)]
    pub throttle_rate: u64,
}

impl Config {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(&self.storage_dir)
            .cancel_grace(Duration::from_millis(self.cancel_grace_ms))
            .throttle_rate(self.throttle_rate)
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 55000;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub listen_addr: SocketAddr,
    /// Batch of jobs to ingest before serving, one command per line.
    pub batch_file: Option<PathBuf>,
    /// Remote workers to launch at startup, one `host [exe]` per line.
    pub worker_file: Option<PathBuf>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            batch_file: None,
            worker_file: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Coordinator url, e.g. `tcp://host:55000`.
    pub url: String,
}

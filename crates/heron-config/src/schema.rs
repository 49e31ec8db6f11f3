//! Configuration sections.
//!
//! Every section rejects unknown fields and fills missing ones with defaults,
//! so a file only needs to name what it changes.

use serde::{Deserialize, Serialize};

/// `[server]`: transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g. "0.0.0.0:8080").
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,

    /// Cap on concurrent connections; absent means unlimited.
    pub max_connections: Option<usize>,

    /// HTTP/1.1 keep-alive.
    pub keep_alive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
            max_connections: None,
            keep_alive: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// `[logging]`: log subscriber settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// Filter directive (e.g. "info" or "heron_server=debug,hyper=warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Include file and line of each event.
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

/// `[metrics]`: Prometheus export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSection {
    /// Install a Prometheus recorder.
    pub enabled: bool,

    /// Standalone listener for `/metrics`; absent means no listener.
    pub listen_addr: Option<String>,
}

/// `[routing]`: route compilation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingSection {
    /// Fail startup when two handlers map the same verb and template,
    /// instead of keeping the later one.
    pub reject_duplicate_routes: bool,
}

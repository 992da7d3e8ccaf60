//! HTTP server configuration settings.

use std::{net::SocketAddr, path::PathBuf};

use serde::Deserialize;

use crate::HealthConfig;

/// Paths routed by the server itself. The health endpoint may not take any of them.
pub const RESERVED_PATHS: [&str; 14] = [
    "/",
    "/options",
    "/first",
    "/first/stream",
    "/clarity",
    "/clarity/stream",
    "/format",
    "/format/stream",
    "/direction",
    "/direction/stream",
    "/examples",
    "/labor",
    "/labor/stream",
    "/end",
];

/// Prefix under which `static_dir` is served.
pub const STATIC_PREFIX: &str = "/static";

/// HTTP server configuration settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// Directory served under `/static`, if any.
    pub static_dir: Option<PathBuf>,
    /// Health endpoint configuration.
    #[serde(default)]
    pub health: HealthConfig,
}

//! Listener settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::Level;

/// Default bind host: all IPv4 interfaces.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// How the webhook listener binds and behaves.
///
/// # Example
///
/// ```
/// use diffcord::listener::ListenerConfig;
///
/// let config = ListenerConfig::new(8080)
///     .with_verify_code("s3cret")
///     .with_silent(true);
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Bind address.
    pub host: IpAddr,

    /// Bind port. 0 lets the OS pick one.
    pub port: u16,

    /// Shared secret expected in the `Authorization` header.
    pub verify_code: Option<String>,

    /// Suppress all listener logging.
    pub silent: bool,

    /// Level of the per-request access log.
    pub log_level: Level,
}

impl ListenerConfig {
    /// Creates a config listening on all interfaces at `port`.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST,
            port,
            verify_code: None,
            silent: false,
            log_level: Level::INFO,
        }
    }

    /// Sets the bind host.
    #[must_use]
    pub const fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Requires `code` in the `Authorization` header of every request.
    #[must_use]
    pub fn with_verify_code(mut self, code: impl Into<String>) -> Self {
        self.verify_code = Some(code.into());
        self
    }

    /// Enables or disables silent mode.
    #[must_use]
    pub const fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Sets the access log level.
    #[must_use]
    pub const fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// The address the listener binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

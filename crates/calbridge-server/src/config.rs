//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default Google Calendar calendars-collection URL.
pub const DEFAULT_GOOGLE_CALENDARS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Default Outlook REST events-collection URL.
pub const DEFAULT_OFFICE365_EVENTS_URL: &str = "https://outlook.office.com/api/v2.0/me/events";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the Unix socket.
    pub socket_path: PathBuf,

    /// Connection timeout.
    pub connection_timeout: Duration,

    /// Maximum concurrent connections.
    pub max_connections: usize,

    /// Whether to remove stale socket on startup.
    pub cleanup_stale_socket: bool,

    /// Google Calendar calendars-collection URL.
    pub google_calendars_url: String,

    /// Outlook REST events-collection URL.
    pub office365_events_url: String,

    /// Token-exchange endpoint for refresh-token swaps.
    pub token_endpoint: String,

    /// Path to the access-info JSON document.
    pub access_info_path: PathBuf,

    /// Path to the internal event-store JSON document.
    pub store_path: PathBuf,

    /// Per-request timeout for remote provider calls.
    pub http_timeout: Duration,

    /// Upper bound on recurrence-collision probe attempts per create.
    pub max_recur_probes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            connection_timeout: Duration::from_secs(30),
            max_connections: 100,
            cleanup_stale_socket: true,
            google_calendars_url: DEFAULT_GOOGLE_CALENDARS_URL.to_string(),
            office365_events_url: DEFAULT_OFFICE365_EVENTS_URL.to_string(),
            token_endpoint: String::new(),
            access_info_path: PathBuf::from("access_info.json"),
            store_path: PathBuf::from("vevents.json"),
            http_timeout: Duration::from_secs(30),
            max_recur_probes: 64,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration with the given socket path.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            ..Default::default()
        }
    }

    /// Builder: set connection timeout.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Builder: set max connections.
    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Builder: set cleanup stale socket.
    #[must_use]
    pub fn with_cleanup_stale_socket(mut self, cleanup: bool) -> Self {
        self.cleanup_stale_socket = cleanup;
        self
    }

    /// Builder: set the token-exchange endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Builder: set the access-info document path.
    #[must_use]
    pub fn with_access_info_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.access_info_path = path.into();
        self
    }

    /// Builder: set the event-store document path.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Builder: set the probe bound for recurrence collisions.
    #[must_use]
    pub fn with_max_recur_probes(mut self, max: usize) -> Self {
        self.max_recur_probes = max;
        self
    }
}

/// Returns the default socket path.
///
/// Uses `$XDG_RUNTIME_DIR/calbridge.sock` if available,
/// otherwise falls back to `/tmp/calbridge-$UID.sock`.
pub fn default_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("calbridge.sock")
    } else {
        #[cfg(unix)]
        let uid = unsafe { libc::getuid() };
        #[cfg(not(unix))]
        let uid = 0;
        PathBuf::from(format!("/tmp/calbridge-{}.sock", uid))
    }
}

// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    pub site: SiteConfig,
    pub compression: CompressionConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Plaintext HTTP port (required)
    pub http_port: u16,
    /// TLS port; absent means HTTP only
    pub https_port: Option<u16>,
    /// Connections with no activity for this long are closed
    pub idle_timeout_ms: u64,
    /// Tokio worker thread count (CPU cores when unset)
    pub workers: Option<usize>,
}

/// TLS certificate material (PEM)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TlsConfig {
    /// Server certificate chain
    pub cert_path: Option<String>,
    /// Private key (PKCS#8, PKCS#1 or SEC1)
    pub key_path: Option<String>,
    /// Extra chain certificates appended to the served chain.
    /// CA augmentation must be explicitly configured, never implicit.
    pub ca_path: Option<String>,
}

/// Document root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Document root directory
    pub root: String,
    /// File served when a request resolves to a directory
    pub welcome_file: String,
    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,
}

/// Response compression configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// Bodies smaller than this are never compressed
    pub min_length: usize,
    /// MIME types (without parameters) eligible for gzip
    pub mime_types: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub max_connections: Option<u64>,
    /// Grace period for in-flight connections during shutdown (seconds)
    pub shutdown_grace_period: u64,
}

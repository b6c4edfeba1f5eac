// Configuration module entry point
// Loads and validates settings, and owns the shared server context

mod types;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;

use crate::error::StartupError;

pub use types::{
    CompressionConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig,
    TlsConfig,
};

impl Config {
    /// Load configuration from the given file path.
    ///
    /// Environment variables prefixed with `FILESRV` override file values
    /// (e.g. `FILESRV_SERVER__HTTP_PORT=8080`). `server.http_port` and
    /// `site.root` have no defaults and must be present.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .add_source(config::Environment::with_prefix("FILESRV").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.idle_timeout_ms", 500_000)?
            .set_default("site.welcome_file", "index.html")?
            .set_default("site.cache_max_age", 86_400)?
            .set_default("compression.enabled", true)?
            .set_default("compression.min_length", 256)?
            .set_default(
                "compression.mime_types",
                vec![
                    "text/html",
                    "text/plain",
                    "text/xml",
                    "text/css",
                    "application/javascript",
                    "text/javascript",
                ],
            )?
            .set_default("logging.access_log", true)?
            .set_default("performance.shutdown_grace_period", 10)?
            .build()?;

        settings.try_deserialize()
    }

    /// Validate settings that the type system cannot express.
    pub fn validate(&self) -> Result<(), StartupError> {
        let root = Path::new(&self.site.root);
        if !root.is_dir() {
            return Err(StartupError::Invalid(format!(
                "site.root '{}' is not a directory",
                self.site.root
            )));
        }
        if self.site.welcome_file.is_empty() || self.site.welcome_file.contains('/') {
            return Err(StartupError::Invalid(format!(
                "site.welcome_file '{}' must be a bare filename",
                self.site.welcome_file
            )));
        }
        if let Some(https_port) = self.server.https_port {
            if https_port == self.server.http_port {
                return Err(StartupError::Invalid(format!(
                    "server.https_port {https_port} collides with server.http_port"
                )));
            }
        }
        Ok(())
    }

    pub fn http_addr(&self) -> Result<SocketAddr, StartupError> {
        parse_addr(&self.server.host, self.server.http_port)
    }

    pub fn https_addr(&self) -> Result<Option<SocketAddr>, StartupError> {
        self.server
            .https_port
            .map(|port| parse_addr(&self.server.host, port))
            .transpose()
    }
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr, StartupError> {
    let addr = format!("{host}:{port}");
    addr.parse()
        .map_err(|e| StartupError::Address(addr.clone(), e))
}

/// Shared, read-only server context
///
/// Built once at startup and handed to every connection task behind an
/// `Arc`. Nothing in here is mutable except the connection counter.
pub struct ServerContext {
    pub config: Config,
    /// Document root as a path, resolved once
    pub document_root: PathBuf,
    /// Lowercased MIME types eligible for gzip, for O(1) lookup
    pub compressible: HashSet<String>,
    /// Currently open connections across both listeners
    pub active_connections: AtomicUsize,
}

impl ServerContext {
    pub fn new(config: Config) -> Self {
        let document_root = PathBuf::from(&config.site.root);
        let compressible = config
            .compression
            .mime_types
            .iter()
            .map(|m| m.trim().to_ascii_lowercase())
            .collect();
        Self {
            config,
            document_root,
            compressible,
            active_connections: AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                http_port: 8080,
                https_port: None,
                idle_timeout_ms: 500_000,
                workers: None,
            },
            tls: TlsConfig::default(),
            site: SiteConfig {
                root: root.to_string(),
                welcome_file: "index.html".to_string(),
                cache_max_age: 86_400,
            },
            compression: CompressionConfig {
                enabled: true,
                min_length: 256,
                mime_types: vec!["text/html".to_string(), "TEXT/CSS ".to_string()],
            },
            logging: LoggingConfig {
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                max_connections: None,
                shutdown_grace_period: 10,
            },
        }
    }

    #[test]
    fn test_validate_rejects_missing_root() {
        let cfg = test_config("/definitely/not/a/real/dir");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_welcome_file_with_slash() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path().to_str().unwrap());
        cfg.site.welcome_file = "sub/index.html".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_port_collision() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path().to_str().unwrap());
        cfg.server.https_port = Some(8080);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_context_normalizes_mime_list() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServerContext::new(test_config(dir.path().to_str().unwrap()));
        assert!(ctx.compressible.contains("text/html"));
        assert!(ctx.compressible.contains("text/css"));
    }

    #[test]
    fn test_addr_parsing() {
        let cfg = test_config("/tmp");
        assert!(cfg.http_addr().is_ok());
        assert!(cfg.https_addr().unwrap().is_none());
    }
}

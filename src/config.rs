// src/config.rs - Configuration management
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
    pub reports: ReportsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: u64,
    pub client_timeout: u64,
    pub client_shutdown: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
    pub idle_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub max_request_size: usize,
    pub require_https: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PaginationConfig {
    pub per_page: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// In-process PDF engine.
    Builtin,
    /// External HTML to PDF converter run as a subprocess.
    Command,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportsConfig {
    pub renderer: RendererKind,
    pub command: Option<String>,
    pub command_args: Vec<String>,
    pub timeout_seconds: u64,
    pub facility_lines: Vec<String>,
    pub pathologist_name: String,
    pub pathologist_license: String,
    pub default_technologist: String,
    pub licenses_file: Option<String>,
    pub left_logo: Option<String>,
    pub right_logo: Option<String>,
    pub signature_image: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            keep_alive: 30,
            client_timeout: 30,
            client_shutdown: 5,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:clinlab.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
            idle_timeout: 600,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
                "http://localhost:8080".to_string(),
            ],
            max_request_size: 1024 * 1024,
            require_https: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { per_page: 50 }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            renderer: RendererKind::Builtin,
            command: None,
            command_args: vec!["--quiet".to_string(), "{input}".to_string(), "{output}".to_string()],
            timeout_seconds: 30,
            facility_lines: vec![
                "CONCEPCION DIAGNOSTIC CENTER".to_string(),
                "LOCAL GOVERNMENT CONCEPCION TARLAC - CLINICAL LABORATORY".to_string(),
                "SAN NICOLAS POBLACION CONCEPCION TARLAC".to_string(),
                "cpdiagnosticlab@gmail.com | (045) 9317-925".to_string(),
            ],
            pathologist_name: "NICK R. FERNANDEZ, M.D.".to_string(),
            pathologist_license: "0100691".to_string(),
            default_technologist: "JULLIUS ANUSENCION, RMT".to_string(),
            licenses_file: None,
            left_logo: None,
            right_logo: None,
            signature_image: None,
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        load_config_file(Path::new(&config_file))?
    } else {
        Config::default()
    };

    override_with_env(&mut config)?;

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn override_with_env(config: &mut Config) -> Result<()> {
    if let Ok(host) = env::var("BIND_ADDRESS") {
        config.server.host = host;
    }
    if let Ok(port_str) = env::var("CLINLAB_PORT") {
        config.server.port = port_str.parse::<u16>()
            .with_context(|| format!("Invalid CLINLAB_PORT: {}", port_str))?;
    }
    if let Ok(workers_str) = env::var("CLINLAB_WORKERS") {
        if let Ok(workers) = workers_str.parse::<usize>() {
            config.server.workers = Some(workers);
        }
    }
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Ok(max_conn_str) = env::var("DATABASE_MAX_CONNECTIONS") {
        if let Ok(max_conn) = max_conn_str.parse::<u32>() {
            config.database.max_connections = max_conn;
        }
    }
    if let Ok(origins_str) = env::var("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(level) = env::var("RUST_LOG") {
        config.logging.level = level;
    }
    if let Ok(renderer) = env::var("REPORT_RENDERER") {
        config.reports.renderer = match renderer.to_lowercase().as_str() {
            "builtin" => RendererKind::Builtin,
            "command" => RendererKind::Command,
            other => anyhow::bail!("Unknown REPORT_RENDERER '{}'", other),
        };
    }
    if let Ok(command) = env::var("REPORT_COMMAND") {
        config.reports.command = Some(command);
    }
    if let Ok(timeout_str) = env::var("REPORT_TIMEOUT_SECONDS") {
        if let Ok(timeout) = timeout_str.parse::<u64>() {
            config.reports.timeout_seconds = timeout;
        }
    }
    if let Ok(path) = env::var("TECHNOLOGIST_LICENSES_FILE") {
        config.reports.licenses_file = Some(path);
    }

    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections < self.database.min_connections {
            return Err(anyhow::anyhow!(
                "max_connections ({}) must be >= min_connections ({})",
                self.database.max_connections,
                self.database.min_connections
            ));
        }

        if !(1..=100).contains(&self.pagination.per_page) {
            anyhow::bail!("pagination.per_page must be between 1 and 100 (current: {})", self.pagination.per_page);
        }

        if self.reports.timeout_seconds == 0 {
            anyhow::bail!("reports.timeout_seconds must be greater than zero");
        }

        if self.reports.renderer == RendererKind::Command
            && self.reports.command.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            anyhow::bail!("reports.command is required when reports.renderer = \"command\"");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        env::var("CLINLAB_ENV").map(|v| v == "production").unwrap_or(false)
    }

    pub fn print_startup_info(&self) {
        log::info!("Clinical laboratory service starting up...");
        log::info!("Server: {}:{}", self.server.host, self.server.port);
        log::info!("Database: {}", self.database.url);
        log::info!("Logging: {} level", self.logging.level);
        log::info!("Report renderer: {:?} (timeout {}s)", self.reports.renderer, self.reports.timeout_seconds);

        if !self.is_production() {
            log::warn!("Running in development mode");
        }

        if self.security.require_https {
            log::info!("HTTPS enforcement enabled");
        } else if self.is_production() {
            log::warn!("HTTPS not required in production mode");
        }
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination.per_page, 50);
        assert_eq!(config.reports.renderer, RendererKind::Builtin);
        assert_eq!(config.reports.timeout_seconds, 30);
        assert_eq!(config.reports.pathologist_license, "0100691");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.database.max_connections = 1;
        config.database.min_connections = 5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reports.renderer = RendererKind::Command;
        assert!(config.validate().is_err());
        config.reports.command = Some("wkhtmltopdf".to_string());
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.reports.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[reports]\nrenderer = \"command\"\ncommand = \"wkhtmltopdf\"\ntimeout_seconds = 5\n"
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.reports.renderer, RendererKind::Command);
        assert_eq!(config.reports.timeout_seconds, 5);
        assert_eq!(config.pagination.per_page, 50);
        assert_eq!(config.reports.facility_lines.len(), 4);
        assert!(config.validate().is_ok());
    }
}

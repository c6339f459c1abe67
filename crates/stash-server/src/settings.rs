//! Configuracion del servidor.
//!
//! Las settings se cargan con el crate `config` desde dos fuentes, en orden
//! de prioridad creciente:
//!
//! 1. Archivo YAML opcional (`stash.yaml`, o la ruta en `STASH_CONFIG`)
//! 2. Variables de entorno con prefijo `STASH` y separador `__`
//!    (por ejemplo `STASH__SERVER__PORT=9000`)
//!
//! Todos los campos tienen valor por defecto.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use stash_store::{CacheConfig, DEFAULT_COLLECTION, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use thiserror::Error;

/// Archivo de configuracion por defecto.
pub const DEFAULT_CONFIG_FILE: &str = "stash.yaml";

/// Variable de entorno con la ruta del archivo de configuracion.
pub const CONFIG_PATH_ENV: &str = "STASH_CONFIG";

/// Errores de carga o validacion de settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Fallo al leer o deserializar las fuentes
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// Valor fuera de rango o mal formado
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Retorna true si el error es de validacion.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// Settings completas del proceso.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cache: CacheSettings,
}

/// Settings del listener HTTP.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origenes permitidos por CORS. Vacio permite cualquiera.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8890,
            cors_origins: Vec::new(),
        }
    }
}

/// Settings de la cache.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Tabla que usa el backend sqlite.
    pub collection: String,
    pub backend: BackendSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL.as_secs(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            collection: DEFAULT_COLLECTION.to_string(),
            backend: BackendSettings::default(),
        }
    }
}

/// Tipo de backend documental.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Moka en memoria, se pierde al reiniciar
    #[default]
    Memory,
    /// SQLite via sqlx
    Sqlite,
}

/// Settings del backend documental.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    pub kind: BackendKind,
    /// URL de conexion, solo usada por `sqlite`.
    pub url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: "sqlite://stash.db".to_string(),
        }
    }
}

impl Settings {
    /// Carga las settings desde `STASH_CONFIG` (o `stash.yaml`) y el entorno.
    pub fn load() -> Result<Self, SettingsError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Carga las settings desde un archivo especifico y el entorno.
    ///
    /// El archivo es opcional: si no existe se usan los defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("STASH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Valida rangos y formatos.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(SettingsError::invalid("server.port", "must be non-zero"));
        }
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(SettingsError::invalid(
                "server.host",
                format!("'{}' is not an IP address", self.server.host),
            ));
        }
        if self.cache.default_ttl_secs == 0 {
            return Err(SettingsError::invalid(
                "cache.default_ttl_secs",
                "must be greater than zero",
            ));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(SettingsError::invalid(
                "cache.sweep_interval_secs",
                "must be greater than zero",
            ));
        }

        let collection = &self.cache.collection;
        let identifier_safe = collection
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !identifier_safe {
            return Err(SettingsError::invalid(
                "cache.collection",
                format!("'{}' must be a plain identifier", collection),
            ));
        }

        if self.cache.backend.kind == BackendKind::Sqlite && self.cache.backend.url.is_empty() {
            return Err(SettingsError::invalid(
                "cache.backend.url",
                "required for the sqlite backend",
            ));
        }

        Ok(())
    }

    /// Direccion de escucha.
    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        let ip: IpAddr = self.server.host.parse().map_err(|_| {
            SettingsError::invalid(
                "server.host",
                format!("'{}' is not an IP address", self.server.host),
            )
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Configuracion de la cache derivada de estas settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: Duration::from_secs(self.cache.default_ttl_secs),
        }
    }

    /// Intervalo entre sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.cache.collection, "cache_entries");
        assert_eq!(settings.cache.default_ttl_secs, 86_400);
        assert_eq!(settings.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(settings.cache.backend.kind, BackendKind::Memory);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.yaml")).unwrap();

        assert_eq!(settings.server.port, ServerSettings::default().port);
    }

    #[test]
    fn test_load_from_yaml() {
        let file = write_yaml(
            r#"
server:
  port: 9100
  cors_origins:
    - "http://localhost:3000"
cache:
  default_ttl_secs: 60
  collection: filings_cache
  backend:
    kind: sqlite
    url: "sqlite://filings.db"
"#,
        );

        let settings = Settings::load_from(file.path()).unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(settings.cache.backend.kind, BackendKind::Sqlite);
        assert_eq!(settings.cache_config().default_ttl, Duration::from_secs(60));
        assert_eq!(settings.cache.collection, "filings_cache");
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;

        let err = settings.validate().unwrap_err();
        assert!(err.is_invalid());
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_rejects_zero_intervals() {
        let mut settings = Settings::default();
        settings.cache.sweep_interval_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.cache.default_ttl_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_unsafe_collection() {
        for name in ["", "1cache", "cache-entries", "cache; DROP TABLE x"] {
            let mut settings = Settings::default();
            settings.cache.collection = name.to_string();
            assert!(settings.validate().is_err(), "{name:?} accepted");
        }
    }

    #[test]
    fn test_invalid_file_is_load_error() {
        let file = write_yaml("server:\n  port: not-a-port\n");

        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(!err.is_invalid());
    }

    #[test]
    fn test_socket_addr() {
        let mut settings = Settings::default();
        settings.server.host = "127.0.0.1".to_string();
        settings.server.port = 9000;

        assert_eq!(
            settings.socket_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
    }
}

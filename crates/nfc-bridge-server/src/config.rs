//! Configuration loading and parsing.
//!
//! Defines the bridge config schema, resolves defaults, and rewrites the
//! persisted active sessions in place.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{ActiveSessions, MediaKind};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_CATALOG_DB: &str = "catalog.sqlite";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Top-level bridge configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Bind address (host:port).
    pub bind: Option<String>,
    /// Jellyfin base URL, e.g. `http://jellyfin.lan:8096`.
    pub media_server_base_url: Option<String>,
    /// Jellyfin API key.
    pub api_key: Option<String>,
    /// Jellyfin user whose library is searched.
    pub target_username: Option<String>,
    /// Optional path to the catalog SQLite file.
    pub catalog_db_path: Option<String>,
    /// Upstream request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Insert example bindings into empty collections at startup (default on).
    pub seed_examples: Option<bool>,
    /// Optional TLS certificate path (PEM).
    pub tls_cert: Option<String>,
    /// Optional TLS private key path (PEM).
    pub tls_key: Option<String>,
    /// Devices selected per media kind, rewritten on every change.
    pub active_sessions: Option<ActiveSessions>,
}

/// Resolved connection settings for the media server.
#[derive(Debug, Clone)]
pub struct MediaServerSettings {
    pub base_url: String,
    pub api_key: String,
    pub target_username: String,
    pub timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ServerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{key} is required in config"))
}

/// Extract and validate the media server settings.
pub fn media_server_from_config(cfg: &ServerConfig) -> Result<MediaServerSettings> {
    let base_url = required(cfg.media_server_base_url.as_deref(), "media_server_base_url")?;
    let api_key = required(cfg.api_key.as_deref(), "api_key")?;
    let target_username = required(cfg.target_username.as_deref(), "target_username")?;
    Ok(MediaServerSettings {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key: api_key.to_string(),
        target_username: target_username.to_string(),
        timeout: Duration::from_millis(
            cfg.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        ),
    })
}

/// Whether the example bindings are seeded into empty collections.
pub fn seed_examples_from_config(cfg: &ServerConfig) -> bool {
    cfg.seed_examples.unwrap_or(true)
}

/// Parse the bind address from config, falling back to the default.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<SocketAddr> {
    let bind = cfg.bind.as_deref().unwrap_or(DEFAULT_BIND);
    bind.parse().with_context(|| format!("parse bind {bind}"))
}

/// Catalog DB path; relative paths are resolved next to the config file.
pub fn catalog_db_path_from_config(cfg: &ServerConfig, config_path: &Path) -> PathBuf {
    let raw = cfg
        .catalog_db_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_CATALOG_DB);
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    match config_path.parent() {
        Some(dir) => dir.join(path),
        None => path,
    }
}

/// TLS cert/key pair; both or neither must be set.
pub fn tls_from_config(cfg: &ServerConfig) -> Result<Option<(PathBuf, PathBuf)>> {
    match (cfg.tls_cert.as_deref(), cfg.tls_key.as_deref()) {
        (Some(cert), Some(key)) => Ok(Some((PathBuf::from(cert), PathBuf::from(key)))),
        (None, None) => Ok(None),
        _ => Err(anyhow::anyhow!("tls_cert and tls_key must be set together")),
    }
}

/// Rewrite the `active_sessions` table of the config file on disk.
///
/// Other keys and comments are preserved. The file is replaced via a rename so a
/// crash mid-write never leaves a truncated config behind.
pub fn update_active_sessions(path: &Path, sessions: &ActiveSessions) -> Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
    let mut doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("parse config {:?}", path))?;

    let mut table = toml_edit::Table::new();
    table.set_implicit(true);
    for kind in MediaKind::ALL {
        let Some(session) = sessions.get(kind) else {
            continue;
        };
        let mut slot = toml_edit::Table::new();
        slot["id"] = toml_edit::value(session.id.as_str());
        slot["device_name"] = toml_edit::value(session.device_name.as_str());
        slot["client_name"] = toml_edit::value(session.client_name.as_str());
        table[kind.slot()] = toml_edit::Item::Table(slot);
    }

    if table.is_empty() {
        doc.remove("active_sessions");
    } else {
        doc["active_sessions"] = toml_edit::Item::Table(table);
    }

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, doc.to_string()).with_context(|| format!("write config {:?}", tmp))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replace config {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionRef;

    fn temp_config(contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "nfc-bridge-config-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).expect("write config");
        path
    }

    const MINIMAL: &str = r#"
# operator note
media_server_base_url = "http://jellyfin.lan:8096/"
api_key = "secret"
target_username = "kids"
"#;

    #[test]
    fn media_server_settings_trim_trailing_slash() {
        let cfg: ServerConfig = toml::from_str(MINIMAL).unwrap();
        let settings = media_server_from_config(&cfg).unwrap();
        assert_eq!(settings.base_url, "http://jellyfin.lan:8096");
        assert_eq!(settings.target_username, "kids");
        assert_eq!(settings.timeout, Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let cfg: ServerConfig = toml::from_str(
            "media_server_base_url = \"http://x\"\ntarget_username = \"kids\"\n",
        )
        .unwrap();
        let err = media_server_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn unparsable_config_fails_to_load() {
        let path = temp_config("media_server_base_url = [");
        assert!(ServerConfig::load(&path).is_err());
    }

    #[test]
    fn missing_config_fails_to_load() {
        let path = std::env::temp_dir()
            .join("nfc-bridge-config-absent")
            .join("config.toml");
        let err = ServerConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("read config"));
    }

    #[test]
    fn examples_are_seeded_unless_disabled() {
        assert!(seed_examples_from_config(&ServerConfig::default()));
        let cfg: ServerConfig = toml::from_str("seed_examples = false").unwrap();
        assert!(!seed_examples_from_config(&cfg));
    }

    #[test]
    fn bind_defaults_when_absent() {
        let cfg = ServerConfig::default();
        assert_eq!(
            bind_from_config(&cfg).unwrap(),
            DEFAULT_BIND.parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn catalog_path_is_relative_to_config_dir() {
        let cfg = ServerConfig::default();
        let path = catalog_db_path_from_config(&cfg, Path::new("/etc/nfc-bridge/config.toml"));
        assert_eq!(path, Path::new("/etc/nfc-bridge").join(DEFAULT_CATALOG_DB));
    }

    #[test]
    fn tls_requires_both_paths() {
        let cfg = ServerConfig {
            tls_cert: Some("cert.pem".to_string()),
            ..ServerConfig::default()
        };
        assert!(tls_from_config(&cfg).is_err());
    }

    #[test]
    fn active_sessions_write_back_preserves_other_keys() {
        let path = temp_config(MINIMAL);
        let sessions = ActiveSessions {
            movie: Some(SessionRef {
                id: "S1".to_string(),
                device_name: "TV".to_string(),
                client_name: "Jellyfin App".to_string(),
            }),
            music: None,
        };
        update_active_sessions(&path, &sessions).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("# operator note"));
        let cfg = ServerConfig::load(&path).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.active_sessions, Some(sessions));

        update_active_sessions(&path, &ActiveSessions::default()).unwrap();
        let cfg = ServerConfig::load(&path).unwrap();
        assert_eq!(cfg.active_sessions, None);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
    pub backoff_cap_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/fieldsync.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:8080".to_string(),
                request_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                max_attempts: 5,
                backoff_base_secs: 0, // 0 disables backoff: retry on every pass
                backoff_cap_secs: 900,
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FIELDSYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_REMOTE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_REQUEST_TIMEOUT") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.request_timeout = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("FIELDSYNC_MAX_ATTEMPTS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.max_attempts = (value.max(1)).min(u32::MAX as u64) as u32;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_BACKOFF_BASE_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.backoff_base_secs = value;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_BACKOFF_CAP_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.backoff_cap_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.storage.data_dir = v;
            }
        }

        cfg
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("fieldsync").to_string_lossy().into_owned())
        .unwrap_or_else(|| "./data".to_string())
}

fn parse_bool(value: &str, fallback: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => fallback,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DEFAULT_APP_NAME: &str = "Activity Tracker";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_API_BASE_PATH: &str = "/api/v1";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub app_name: String,
    pub bind_address: SocketAddr,
    pub api_base_path: String,
    pub cors_allowed_origin: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), InfraError> {
        if !self.api_base_path.starts_with('/') {
            return Err(InfraError::InvalidConfig(format!(
                "apiBasePath must start with '/': {}",
                self.api_base_path
            )));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(InfraError::InvalidConfig(
                "page sizes must be > 0".to_string(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(InfraError::InvalidConfig(format!(
                "defaultPageSize {} exceeds maxPageSize {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_base_path: DEFAULT_API_BASE_PATH.to_string(),
            cors_allowed_origin: DEFAULT_CORS_ORIGIN.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([(
        APP_JSON,
        serde_json::json!({
            "schema": 1,
            "appName": DEFAULT_APP_NAME,
            "bindAddress": DEFAULT_BIND_ADDRESS,
            "apiBasePath": DEFAULT_API_BASE_PATH,
            "corsAllowedOrigin": DEFAULT_CORS_ORIGIN,
            "defaultPageSize": DEFAULT_PAGE_SIZE,
            "maxPageSize": MAX_PAGE_SIZE
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn read_string(app: &serde_json::Value, key: &str) -> Option<String> {
    app.get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn read_page_size(app: &serde_json::Value, key: &str, default: u32) -> Result<u32, InfraError> {
    match app.get(key) {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|size| u32::try_from(size).ok())
            .ok_or_else(|| InfraError::InvalidConfig(format!("{key} must be a positive integer"))),
    }
}

fn parse_bind_address(raw: &str) -> Result<SocketAddr, InfraError> {
    raw.trim()
        .parse()
        .map_err(|error| InfraError::InvalidConfig(format!("invalid bindAddress '{raw}': {error}")))
}

pub fn load_server_config(config_dir: &Path) -> Result<ServerConfig, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let defaults = ServerConfig::default();

    let bind_address = match read_string(&app, "bindAddress") {
        Some(raw) => parse_bind_address(&raw)?,
        None => defaults.bind_address,
    };

    let config = ServerConfig {
        app_name: read_string(&app, "appName").unwrap_or(defaults.app_name),
        bind_address,
        api_base_path: read_string(&app, "apiBasePath").unwrap_or(defaults.api_base_path),
        cors_allowed_origin: read_string(&app, "corsAllowedOrigin")
            .unwrap_or(defaults.cors_allowed_origin),
        default_page_size: read_page_size(&app, "defaultPageSize", defaults.default_page_size)?,
        max_page_size: read_page_size(&app, "maxPageSize", defaults.max_page_size)?,
    };
    config.validate()?;
    Ok(config)
}

/// Applies environment overrides on top of a loaded config.
pub fn apply_server_overrides<F>(mut config: ServerConfig, lookup: F) -> Result<ServerConfig, InfraError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = optional_lookup_value(&lookup, &["ACTIVITY_BIND_ADDRESS"]) {
        config.bind_address = parse_bind_address(&raw)?;
    }
    if let Some(origin) = optional_lookup_value(&lookup, &["ACTIVITY_CORS_ORIGIN", "CORS_FRONTEND_URI"]) {
        config.cors_allowed_origin = origin;
    }
    if let Some(base_path) = optional_lookup_value(&lookup, &["ACTIVITY_API_BASE_PATH"]) {
        config.api_base_path = base_path;
    }
    config.validate()?;
    Ok(config)
}

pub fn load_client_config_from_lookup<F>(lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    ClientConfig {
        base_url: optional_lookup_value(&lookup, &["ACTIVITY_API_BASE_URL", "API_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
    }
}

fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}

use std::env;
use std::fs;
use std::path::Path;

use freshprice_core::config::{locate_config_file, AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = locate_config_file(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key_path, field.value));
    }

    lines.join("\n")
}

fn field(key_path: &'static str, env_keys: &'static [&'static str], value: String) -> Field {
    Field { key_path, env_keys, value }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        field("database.url", &["FRESHPRICE_DATABASE_URL"], config.database.url.clone()),
        field(
            "database.max_connections",
            &["FRESHPRICE_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        field(
            "database.timeout_secs",
            &["FRESHPRICE_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        field(
            "server.bind_address",
            &["FRESHPRICE_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        field(
            "server.health_check_port",
            &["FRESHPRICE_SERVER_HEALTH_CHECK_PORT"],
            config.server.health_check_port.to_string(),
        ),
        field(
            "server.graceful_shutdown_secs",
            &["FRESHPRICE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        field(
            "pricing.refresh_interval_secs",
            &["FRESHPRICE_PRICING_REFRESH_INTERVAL_SECS"],
            config.pricing.refresh_interval_secs.to_string(),
        ),
        field(
            "pricing.tax_rate_pct",
            &["FRESHPRICE_PRICING_TAX_RATE_PCT"],
            config.pricing.tax_rate_pct.to_string(),
        ),
        field(
            "pricing.simulate_variation",
            &["FRESHPRICE_PRICING_SIMULATE_VARIATION"],
            config.pricing.simulate_variation.to_string(),
        ),
        field(
            "pricing.dataset_path",
            &["FRESHPRICE_PRICING_DATASET_PATH"],
            config
                .pricing
                .dataset_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
        ),
        field(
            "logging.level",
            &["FRESHPRICE_LOGGING_LEVEL", "FRESHPRICE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        field(
            "logging.format",
            &["FRESHPRICE_LOGGING_FORMAT", "FRESHPRICE_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

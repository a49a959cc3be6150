use std::collections::HashMap;
use std::path::Path;

use crate::app_config::{AppConfig, CheckpointMode};
use crate::ConfigError;

/// Name of the key-value credentials file expected inside `scrape_env_dir`.
pub const CREDENTIALS_FILE_NAME: &str = "scrape-it.env";

const DEFAULT_BASE_URL: &str = "https://api.scrape-it.cloud";

/// Load application configuration from `{env_dir}/scrape-it.env`.
///
/// The file is parsed with `dotenvy` but NOT merged into the process
/// environment. Every setting is looked up in the file first and in the
/// process environment second, so tunables can live in either place.
///
/// # Errors
///
/// Returns `ConfigError` if the file is missing or malformed, `API_KEY` is
/// absent or blank, or any tunable fails to parse.
pub fn load_app_config(env_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = env_dir.join(CREDENTIALS_FILE_NAME);
    let file_vars = read_env_file(&path)?;
    build_app_config(|key| match file_vars.get(key) {
        Some(value) => Ok(value.clone()),
        None => std::env::var(key),
    })
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_err = |source| ConfigError::CredentialsFile {
        path: path.to_path_buf(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(to_err)?
        .map(|item| item.map_err(to_err))
        .collect()
}

/// Build application configuration using the provided lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_key = lookup("API_KEY")
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar("API_KEY".to_string()))?;

    let base_url = or_default("LOCHARVEST_BASE_URL", DEFAULT_BASE_URL);
    let log_level = or_default("LOCHARVEST_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("LOCHARVEST_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default(
        "LOCHARVEST_USER_AGENT",
        "locharvest/0.1 (local-business-harvest)",
    );
    let page_delay_ms = parse_u64("LOCHARVEST_PAGE_DELAY_MS", "2000")?;
    let retry_wait_ms = parse_u64("LOCHARVEST_RETRY_WAIT_MS", "1000")?;

    let raw_attempts = or_default("LOCHARVEST_MAX_ATTEMPTS", "2");
    let max_attempts = raw_attempts
        .trim()
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "LOCHARVEST_MAX_ATTEMPTS".to_string(),
            reason: e.to_string(),
        })?;
    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOCHARVEST_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let checkpoint_mode =
        parse_checkpoint_mode(&or_default("LOCHARVEST_CHECKPOINT_MODE", "snapshot"))?;

    Ok(AppConfig {
        api_key,
        base_url,
        log_level,
        request_timeout_secs,
        user_agent,
        page_delay_ms,
        max_attempts,
        retry_wait_ms,
        checkpoint_mode,
    })
}

/// Parse a string into a `CheckpointMode` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than `snapshot`
/// or `log`.
fn parse_checkpoint_mode(s: &str) -> Result<CheckpointMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "snapshot" => Ok(CheckpointMode::Snapshot),
        "log" => Ok(CheckpointMode::Log),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LOCHARVEST_CHECKPOINT_MODE".to_string(),
            reason: format!("unknown checkpoint mode \"{other}\" (expected snapshot or log)"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

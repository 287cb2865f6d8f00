//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, EngineConfig, QrConfig};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "duration" => {
            parse_capture_duration(value).map_err(|message| invalid(key, message))?;
            config.duration = Some(value.to_string());
        }
        "payload_limit" => {
            config.payload_limit = Some(parse_positive(key, value)? as usize);
        }
        "prefer_quality" => {
            config.prefer_quality = Some(parse_bool(value).map_err(|_| bool_error(key))?);
        }
        "output" => {
            config.output = Some(non_empty(key, value)?);
        }
        "qr.image_size" => {
            config.qr.get_or_insert_with(QrConfig::default).image_size =
                Some(parse_positive(key, value)?);
        }
        "qr.margin" => {
            let margin = value
                .parse::<u32>()
                .map_err(|_| invalid(key, "Value must be a non-negative integer".to_string()))?;
            config.qr.get_or_insert_with(QrConfig::default).margin = Some(margin);
        }
        "engine.ffmpeg_path" => {
            config
                .engine
                .get_or_insert_with(EngineConfig::default)
                .ffmpeg_path = Some(non_empty(key, value)?);
        }
        _ => return Err(invalid(key, "Unknown key".to_string())),
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "duration" => config.duration.clone(),
        "payload_limit" => config.payload_limit.map(|v| v.to_string()),
        "prefer_quality" => config.prefer_quality.map(|b| b.to_string()),
        "output" => config.output.clone(),
        "qr.image_size" => config
            .qr
            .as_ref()
            .and_then(|q| q.image_size)
            .map(|v| v.to_string()),
        "qr.margin" => config
            .qr
            .as_ref()
            .and_then(|q| q.margin)
            .map(|v| v.to_string()),
        "engine.ffmpeg_path" => config.engine.as_ref().and_then(|e| e.ffmpeg_path.clone()),
        _ => None,
    }
}

/// Parse a duration that a single QR code can hold
pub fn parse_capture_duration(value: &str) -> Result<Duration, String> {
    let duration = value.parse::<Duration>().map_err(|e| e.to_string())?;
    if duration.exceeds_capture_limit() {
        return Err(format!(
            "Duration {} is too long; the maximum is {}",
            duration,
            Duration::max_capture()
        ));
    }
    Ok(duration)
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message,
    }
}

fn bool_error(key: &str) -> ConfigError {
    invalid(key, "Value must be 'true' or 'false'".to_string())
}

fn parse_positive(key: &str, value: &str) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, "Value must be a positive integer".to_string())),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(key, "Value must not be empty".to_string()));
    }
    Ok(value.to_string())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

//! TOML settings file loading
//!
//! Keys mirror the long option names (`interval-ms`, `log-level`, ...). File
//! values only fill options that were not given on the command line.

use crate::streaming::error::{StreamError, StreamResult};
use std::path::{Path, PathBuf};

use super::args::Args;

/// `<config_dir>/Streamtick/streamtick.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Streamtick").join("streamtick.toml"))
}

impl Args {
    /// Load the settings file named by `--config-file`, or the default one if present
    ///
    /// Returns the path that was applied. An explicitly named file must exist;
    /// a missing default file is not an error.
    pub async fn load_config_file(args: &mut Self) -> StreamResult<Option<PathBuf>> {
        let path = match &args.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(StreamError::config(format!(
                        "The specified configuration file does not exist: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let config = read_toml(&path).await?;
        Self::apply_toml_values(args, &config).map_err(|e| {
            StreamError::config(format!(
                "Error in configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Some(path))
    }

    /// Apply TOML values to every option still unset
    pub fn apply_toml_values(args: &mut Self, config: &toml::Table) -> Result<(), String> {
        fill(&mut args.oci_config, path_value(config, "oci-config")?);
        fill(&mut args.profile, string_value(config, "profile")?);
        fill(&mut args.interval_ms, integer_value(config, "interval-ms")?);
        fill(&mut args.partition, string_value(config, "partition")?);
        fill(&mut args.instance_name, string_value(config, "instance-name")?);
        fill(&mut args.group_timeout_ms, integer_value(config, "group-timeout-ms")?);
        fill(&mut args.limit, integer_value(config, "limit")?);
        fill(&mut args.max_attempts, integer_value(config, "max-attempts")?);
        fill(&mut args.retry_delay_ms, integer_value(config, "retry-delay-ms")?);
        fill(&mut args.log_level, string_value(config, "log-level")?);
        fill(&mut args.log_format, string_value(config, "log-format")?);
        fill(&mut args.log_file, path_value(config, "log-file")?);

        // `group = true` joins the default group, `group = "name"` a named one
        if args.group.is_none() {
            match config.get("group") {
                None => {}
                Some(toml::Value::Boolean(true)) => {
                    args.group = Some(crate::streaming::cursor::DEFAULT_GROUP_NAME.to_string())
                }
                Some(toml::Value::Boolean(false)) => {}
                Some(toml::Value::String(name)) => args.group = Some(name.clone()),
                Some(_) => return Err("'group' must be a string or a boolean".to_string()),
            }
        }

        if !args.color && !args.no_color {
            if let Some(color) = bool_value(config, "color")? {
                args.color = color;
                args.no_color = !color;
            } else if let Some(no_color) = bool_value(config, "no-color")? {
                args.no_color = no_color;
            }
        }

        if let Some(level) = &args.log_level {
            if !matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "off"
            ) {
                return Err(format!("invalid log-level '{}'", level));
            }
        }
        if let Some(format) = &args.log_format {
            if !matches!(format.as_str(), "text" | "ext" | "json") {
                return Err(format!("invalid log-format '{}'", format));
            }
        }
        Ok(())
    }
}

async fn read_toml(path: &Path) -> StreamResult<toml::Table> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        StreamError::config(format!(
            "Error reading configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str::<toml::Table>(&contents).map_err(|e| {
        StreamError::config(format!(
            "Error parsing configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

fn fill<T>(target: &mut Option<T>, value: Option<T>) {
    if target.is_none() {
        *target = value;
    }
}

fn string_value(config: &toml::Table, key: &str) -> Result<Option<String>, String> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| format!("'{}' must be a string", key)),
    }
}

fn path_value(config: &toml::Table, key: &str) -> Result<Option<PathBuf>, String> {
    Ok(string_value(config, key)?.map(PathBuf::from))
}

fn bool_value(config: &toml::Table, key: &str) -> Result<Option<bool>, String> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| format!("'{}' must be true or false", key)),
    }
}

fn integer_value<T: TryFrom<i64>>(config: &toml::Table, key: &str) -> Result<Option<T>, String> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => {
            let raw = value
                .as_integer()
                .ok_or_else(|| format!("'{}' must be an integer", key))?;
            T::try_from(raw)
                .map(Some)
                .map_err(|_| format!("'{}' is out of range: {}", key, raw))
        }
    }
}

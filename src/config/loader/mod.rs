use crate::config::Config;
use crate::config::env::{deep_merge, env_overrides};
use crate::utils::{ensure_dir, get_qqbridge_home};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_qqbridge_home()?.join("config.json"))
}

/// Load configuration with environment variable overrides.
///
/// Priority (highest to lowest): `QQBRIDGE_*` environment variables, the
/// config file, built-in defaults. A missing, unreadable or malformed file is
/// reported and treated as empty. The merged result must still deserialize
/// and validate.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    load_config_with_env(config_path, std::env::vars())
}

/// Like [`load_config`], with the environment supplied by the caller.
pub fn load_config_with_env<I, K, V>(config_path: Option<&Path>, vars: I) -> Result<Config>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    let file_data = read_config_file(path);
    let merged = deep_merge(file_data, env_overrides(vars));

    let config: Config = match &merged {
        Value::Object(map) if map.is_empty() => Config::default(),
        _ => serde_json::from_value(merged).with_context(|| "Failed to deserialize config")?,
    };

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    Ok(config)
}

/// Read and migrate the config file, falling back to an empty object.
fn read_config_file(path: &Path) -> Value {
    if !path.exists() {
        debug!("no config file at {}, using defaults", path.display());
        return Value::Object(Map::new());
    }

    match read_locked(path) {
        Ok(data) => {
            check_file_permissions(path);
            migrate_config(data)
        }
        Err(e) => {
            warn!(
                "Failed to load config from {}: {:#}. Using default configuration with environment overrides.",
                path.display(),
                e
            );
            Value::Object(Map::new())
        }
    }
}

fn read_locked(path: &Path) -> Result<Value> {
    // Shared lock: concurrent readers, blocked while a writer holds it
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open config at {}", path.display()))?;
    file.lock_shared()
        .with_context(|| "Failed to acquire shared lock on config file")?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    // Lock released when `file` drops at end of scope

    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
    if !data.is_object() {
        anyhow::bail!("top-level config value must be a JSON object");
    }
    Ok(data)
}

/// Warn if the config file or its parent directory has overly permissive permissions.
/// Only emits warnings once per process to avoid spam when config is loaded multiple times.
#[cfg(unix)]
fn check_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Once;

    static WARNED: Once = Once::new();
    WARNED.call_once(|| {
        if let Ok(meta) = std::fs::metadata(path) {
            let mode = meta.permissions().mode();
            if mode & 0o077 != 0 {
                warn!(
                    "config file {} has permissions {:o}, recommend 0600",
                    path.display(),
                    mode & 0o777
                );
            }
        }
    });
}

#[cfg(not(unix))]
fn check_file_permissions(_path: &Path) {
    // Permission checks only apply on unix systems
}

fn migrate_config(data: Value) -> Value {
    // Move tools.exec.restrictToWorkspace → tools.restrictToWorkspace
    if let Value::Object(mut map) = data {
        if let Some(Value::Object(tools_map)) = map.get_mut("tools")
            && !tools_map.contains_key("restrictToWorkspace")
            && let Some(Value::Object(exec_map)) = tools_map.get_mut("exec")
            && let Some(restrict) = exec_map.remove("restrictToWorkspace")
        {
            debug!("migrated tools.exec.restrictToWorkspace to tools.restrictToWorkspace");
            tools_map.insert("restrictToWorkspace".to_string(), restrict);
        }
        Value::Object(map)
    } else {
        data
    }
}

pub fn save_config(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    ensure_dir(path.parent().context("Config path has no parent")?)?;

    // Acquire exclusive lock via separate lockfile.
    // A separate file is needed because atomic_write() uses rename(), which
    // invalidates flock on the original inode. The .lock file survives renames.
    let lock_path = path.with_extension("json.lock");
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file at {}", lock_path.display()))?;
    lock_file
        .lock_exclusive()
        .with_context(|| "Failed to acquire exclusive lock on config lock file")?;

    // serde `rename` attributes already produce camelCase keys
    let content = serde_json::to_string_pretty(config)?;
    crate::utils::atomic_write(path, &content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    // Restrict permissions (best-effort, may fail on Windows)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }

    // Lock released when lock_file drops
    Ok(())
}

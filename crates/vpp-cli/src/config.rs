//! Bridge configuration – reads/writes `~/.vpp/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use vpp_kernel::{AdapterConfig, LongitudinalMode};
use vpp_middleware::reporter::DEFAULT_FRAME_ID;

/// Persisted bridge configuration.
///
/// The adapter tunables sit at the top level of the file next to the loop
/// rates; `[pid]`, `[throttle_remap]` and `[brake_remap]` are sub-tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed physics tick rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Status publish rate; the reporter clamps it to `[1, 60]`.
    #[serde(default = "default_publish_hz")]
    pub publish_hz: u32,

    /// Frame id stamped on every status batch.
    #[serde(default = "default_frame_id")]
    pub frame_id: String,

    /// Accelerator calibration CSV.  Without one the accel map is empty and
    /// the pedal-map strategy releases both pedals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel_map_path: Option<PathBuf>,

    /// Brake calibration CSV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_map_path: Option<PathBuf>,

    #[serde(flatten)]
    pub adapter: AdapterConfig,
}

fn default_tick_hz() -> u32 {
    50
}
fn default_publish_hz() -> u32 {
    30
}
fn default_frame_id() -> String {
    DEFAULT_FRAME_ID.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            publish_hz: default_publish_hz(),
            frame_id: default_frame_id(),
            accel_map_path: None,
            brake_map_path: None,
            adapter: AdapterConfig::default(),
        }
    }
}

/// Return the path to `~/.vpp/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".vpp").join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.  Environment overrides are applied to a loaded file only; the
/// caller applies them to defaults.
pub fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `VPP_*` environment variable overrides to `cfg`.  Values that do
/// not parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `VPP_TICK_HZ` | `tick_hz` |
/// | `VPP_PUBLISH_HZ` | `publish_hz` |
/// | `VPP_ACCEL_MAP` | `accel_map_path` |
/// | `VPP_BRAKE_MAP` | `brake_map_path` |
/// | `VPP_LONGITUDINAL` | `longitudinal` (`pedal_map` or `pid`) |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("VPP_TICK_HZ")
        && let Ok(hz) = v.parse::<u32>()
        && hz > 0
    {
        cfg.tick_hz = hz;
    }
    if let Ok(v) = std::env::var("VPP_PUBLISH_HZ")
        && let Ok(hz) = v.parse::<u32>()
    {
        cfg.publish_hz = hz;
    }
    if let Ok(v) = std::env::var("VPP_ACCEL_MAP") {
        cfg.accel_map_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("VPP_BRAKE_MAP") {
        cfg.brake_map_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("VPP_LONGITUDINAL")
        && let Some(mode) = parse_longitudinal(&v)
    {
        cfg.adapter.longitudinal = mode;
    }
}

fn parse_longitudinal(value: &str) -> Option<LongitudinalMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pedal_map" | "pedal-map" => Some(LongitudinalMode::PedalMap),
        "pid" => Some(LongitudinalMode::Pid),
        _ => None,
    }
}

/// Save the config to a specific path, creating the parent directory.
pub fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

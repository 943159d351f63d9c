//! Configuration Vault – reads/writes `~/.archmage/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use archmage_perception::ClassifierStrategy;
use archmage_runtime::GameConfig;
use serde::{Deserialize, Serialize};

/// Persisted server configuration stored in `~/.archmage/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP/WebSocket port of the game server.
    pub port: u16,

    /// Pose classifier: `rules` or `model`.
    pub classifier: ClassifierStrategy,

    /// JSON centroid artifact used when `classifier = "model"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    pub cooldown_ms: u64,
    pub max_mana: f32,
    pub starting_mana: f32,
    pub mana_regen_per_sec: f32,
    pub event_cooldown_secs: f64,
    pub event_duration_secs: f64,

    /// Fixed seed for event draws; unset means random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let game = GameConfig::default();
        Self {
            port: archmage_server::DEFAULT_PORT,
            classifier: ClassifierStrategy::default(),
            model_path: None,
            cooldown_ms: game.cooldown.as_millis() as u64,
            max_mana: game.max_mana,
            starting_mana: game.starting_mana,
            mana_regen_per_sec: game.mana_regen_per_sec,
            event_cooldown_secs: game.event_cooldown.as_secs_f64(),
            event_duration_secs: game.event_duration.as_secs_f64(),
            rng_seed: None,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl Config {
    /// Game tuning for the session registry.
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            cooldown: Duration::from_millis(self.cooldown_ms),
            max_mana: self.max_mana,
            starting_mana: self.starting_mana,
            mana_regen_per_sec: self.mana_regen_per_sec,
            event_cooldown: secs(self.event_cooldown_secs),
            event_duration: secs(self.event_duration_secs),
            rng_seed: self.rng_seed,
        }
    }
}

/// Return the path to `~/.archmage/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".archmage").join("config.toml")
}

/// Load the config from disk. `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ARCHMAGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ARCHMAGE_PORT` | `port` |
/// | `ARCHMAGE_CLASSIFIER` | `classifier` |
/// | `ARCHMAGE_MODEL_PATH` | `model_path` |
/// | `ARCHMAGE_COOLDOWN_MS` | `cooldown_ms` |
/// | `ARCHMAGE_MAX_MANA` | `max_mana` |
/// | `ARCHMAGE_STARTING_MANA` | `starting_mana` |
/// | `ARCHMAGE_MANA_REGEN` | `mana_regen_per_sec` |
/// | `ARCHMAGE_EVENT_COOLDOWN_SECS` | `event_cooldown_secs` |
/// | `ARCHMAGE_EVENT_DURATION_SECS` | `event_duration_secs` |
/// | `ARCHMAGE_RNG_SEED` | `rng_seed` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

fn set_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut T) {
    if let Some(v) = lookup(key)
        && let Ok(parsed) = v.trim().parse::<T>()
    {
        *field = parsed;
    }
}

pub(crate) fn apply_overrides_from(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    set_parsed(&lookup, "ARCHMAGE_PORT", &mut cfg.port);
    set_parsed(&lookup, "ARCHMAGE_COOLDOWN_MS", &mut cfg.cooldown_ms);
    set_parsed(&lookup, "ARCHMAGE_MAX_MANA", &mut cfg.max_mana);
    set_parsed(&lookup, "ARCHMAGE_STARTING_MANA", &mut cfg.starting_mana);
    set_parsed(&lookup, "ARCHMAGE_MANA_REGEN", &mut cfg.mana_regen_per_sec);
    set_parsed(&lookup, "ARCHMAGE_EVENT_COOLDOWN_SECS", &mut cfg.event_cooldown_secs);
    set_parsed(&lookup, "ARCHMAGE_EVENT_DURATION_SECS", &mut cfg.event_duration_secs);

    if let Some(v) = lookup("ARCHMAGE_CLASSIFIER") {
        match v.trim().to_ascii_lowercase().as_str() {
            "rules" => cfg.classifier = ClassifierStrategy::Rules,
            "model" => cfg.classifier = ClassifierStrategy::Model,
            _ => {}
        }
    }
    if let Some(v) = lookup("ARCHMAGE_MODEL_PATH") {
        cfg.model_path = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("ARCHMAGE_RNG_SEED")
        && let Ok(seed) = v.trim().parse::<u64>()
    {
        cfg.rng_seed = Some(seed);
    }
}

/// Save the config to disk, creating `~/.archmage/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Owner-only file (rw-------) on Unix.
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

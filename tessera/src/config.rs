//! Render configuration.
//!
//! [`RenderConfig`] is built once at startup and handed to the components
//! that need it. It is persisted as an INI file:
//!
//! ```ini
//! [tiles]
//! tile_width = 128
//! tile_height = 128
//! shared_cache_bytes = 256MB
//! ttl_secs = 600
//!
//! [multires]
//! cache_policy = bounded
//! capacity = 16
//!
//! [fonts]
//! fallback = SansSerif
//! Helvetica = SansSerif
//! ```
//!
//! A missing file means defaults. Unknown keys are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::cache::{EvictionPolicy, DEFAULT_SHARED_CACHE_BYTES};
use crate::fonts::{FontFamilyMap, DEFAULT_FALLBACK_FAMILY};
use crate::multires::{CachePolicy, DEFAULT_SUBTREE_CAPACITY};
use crate::tile::DEFAULT_TILE_SIZE;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

const SECTION_TILES: &str = "tiles";
const SECTION_MULTIRES: &str = "multires";
const SECTION_FONTS: &str = "fonts";
const KEY_FALLBACK: &str = "fallback";

/// Errors loading, saving, or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] ini::ParseError),

    #[error("Invalid value for {section}.{key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

impl From<ini::Error> for ConfigError {
    fn from(e: ini::Error) -> Self {
        match e {
            ini::Error::Io(e) => ConfigError::Io(e),
            ini::Error::Parse(e) => ConfigError::Parse(e),
        }
    }
}

/// Directory holding tessera's configuration.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tessera")
}

/// Full path of the default configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Tile grid and shared cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSettings {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Byte budget of the process-wide shared tile cache.
    pub shared_cache_bytes: u64,
    pub ttl: Option<Duration>,
    pub idle: Option<Duration>,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            shared_cache_bytes: DEFAULT_SHARED_CACHE_BYTES,
            ttl: None,
            idle: None,
        }
    }
}

/// Multi-resolution sub-tree cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiResSettings {
    pub bounded: bool,
    pub capacity: u64,
    pub ttl: Option<Duration>,
}

impl Default for MultiResSettings {
    fn default() -> Self {
        Self {
            bounded: true,
            capacity: DEFAULT_SUBTREE_CAPACITY,
            ttl: None,
        }
    }
}

impl MultiResSettings {
    pub fn cache_policy_name(&self) -> &'static str {
        if self.bounded {
            "bounded"
        } else {
            "weak"
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        if self.bounded {
            CachePolicy::Bounded {
                capacity: self.capacity,
                ttl: self.ttl,
            }
        } else {
            CachePolicy::Weak
        }
    }
}

/// Font table settings: fallback plus per-name overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSettings {
    pub fallback: String,
    pub overrides: BTreeMap<String, String>,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_FALLBACK_FAMILY.to_string(),
            overrides: BTreeMap::new(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderConfig {
    pub tiles: TileSettings,
    pub multires: MultiResSettings,
    pub fonts: FontSettings,
}

impl RenderConfig {
    /// Load from the default location, falling back to defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_ini(&Ini::load_from_str(text)?)
    }

    /// Read recognized keys from a parsed INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(SECTION_TILES)) {
            for (key, value) in section.iter() {
                if let Ok(k) = ConfigKey::lookup(SECTION_TILES, key) {
                    k.set(&mut config, value)?;
                }
            }
        }

        if let Some(section) = ini.section(Some(SECTION_MULTIRES)) {
            for (key, value) in section.iter() {
                if let Ok(k) = ConfigKey::lookup(SECTION_MULTIRES, key) {
                    k.set(&mut config, value)?;
                }
            }
        }

        if let Some(section) = ini.section(Some(SECTION_FONTS)) {
            for (key, value) in section.iter() {
                let value = value.trim();
                if key == KEY_FALLBACK {
                    config.fonts.fallback = value.to_string();
                } else if !value.is_empty() {
                    config.fonts.overrides.insert(key.to_string(), value.to_string());
                }
            }
        }

        Ok(config)
    }

    /// Render as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        for (name, family) in &self.fonts.overrides {
            ini.with_section(Some(SECTION_FONTS))
                .set(name.as_str(), family.as_str());
        }
        ini
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        debug!(path = %path.display(), "Saved config file");
        Ok(())
    }

    /// Eviction policy for the shared tile cache.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        let mut policy = EvictionPolicy::capacity(self.tiles.shared_cache_bytes);
        if let Some(ttl) = self.tiles.ttl {
            policy = policy.with_ttl(ttl);
        }
        if let Some(idle) = self.tiles.idle {
            policy = policy.with_idle(idle);
        }
        policy
    }

    /// Font table: generic mappings, then configured overrides.
    pub fn font_map(&self) -> FontFamilyMap {
        let mut map = FontFamilyMap::generic();
        map.set_fallback(self.fonts.fallback.clone());
        for (name, family) in &self.fonts.overrides {
            map.insert(name.clone(), family.clone());
        }
        map
    }
}

/// Scalar configuration keys addressable as `section.key`.
///
/// Font overrides are free-form and not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    TilesTileWidth,
    TilesTileHeight,
    TilesSharedCacheBytes,
    TilesTtlSecs,
    TilesIdleSecs,
    MultiresCachePolicy,
    MultiresCapacity,
    MultiresTtlSecs,
    FontsFallback,
}

impl ConfigKey {
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TilesTileWidth,
            ConfigKey::TilesTileHeight,
            ConfigKey::TilesSharedCacheBytes,
            ConfigKey::TilesTtlSecs,
            ConfigKey::TilesIdleSecs,
            ConfigKey::MultiresCachePolicy,
            ConfigKey::MultiresCapacity,
            ConfigKey::MultiresTtlSecs,
            ConfigKey::FontsFallback,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::TilesTileWidth
            | ConfigKey::TilesTileHeight
            | ConfigKey::TilesSharedCacheBytes
            | ConfigKey::TilesTtlSecs
            | ConfigKey::TilesIdleSecs => SECTION_TILES,
            ConfigKey::MultiresCachePolicy
            | ConfigKey::MultiresCapacity
            | ConfigKey::MultiresTtlSecs => SECTION_MULTIRES,
            ConfigKey::FontsFallback => SECTION_FONTS,
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::TilesTileWidth => "tile_width",
            ConfigKey::TilesTileHeight => "tile_height",
            ConfigKey::TilesSharedCacheBytes => "shared_cache_bytes",
            ConfigKey::TilesTtlSecs | ConfigKey::MultiresTtlSecs => "ttl_secs",
            ConfigKey::TilesIdleSecs => "idle_secs",
            ConfigKey::MultiresCachePolicy => "cache_policy",
            ConfigKey::MultiresCapacity => "capacity",
            ConfigKey::FontsFallback => KEY_FALLBACK,
        }
    }

    /// Dotted name, e.g. `tiles.tile_width`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    fn lookup(section: &str, key: &str) -> Result<Self, ConfigError> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.section() == section && k.key_name() == key)
            .ok_or_else(|| ConfigError::UnknownKey(format!("{}.{}", section, key)))
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &RenderConfig) -> String {
        match self {
            ConfigKey::TilesTileWidth => config.tiles.tile_width.to_string(),
            ConfigKey::TilesTileHeight => config.tiles.tile_height.to_string(),
            ConfigKey::TilesSharedCacheBytes => config.tiles.shared_cache_bytes.to_string(),
            ConfigKey::TilesTtlSecs => secs_to_string(config.tiles.ttl),
            ConfigKey::TilesIdleSecs => secs_to_string(config.tiles.idle),
            ConfigKey::MultiresCachePolicy => config.multires.cache_policy_name().to_string(),
            ConfigKey::MultiresCapacity => config.multires.capacity.to_string(),
            ConfigKey::MultiresTtlSecs => secs_to_string(config.multires.ttl),
            ConfigKey::FontsFallback => config.fonts.fallback.clone(),
        }
    }

    /// Parse `value` and store it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the text does not parse.
    pub fn set(&self, config: &mut RenderConfig, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::TilesTileWidth => config.tiles.tile_width = self.parse_tile_size(value)?,
            ConfigKey::TilesTileHeight => config.tiles.tile_height = self.parse_tile_size(value)?,
            ConfigKey::TilesSharedCacheBytes => {
                config.tiles.shared_cache_bytes =
                    parse_size(value).ok_or_else(|| self.invalid(value))?
            }
            ConfigKey::TilesTtlSecs => config.tiles.ttl = self.parse_secs(value)?,
            ConfigKey::TilesIdleSecs => config.tiles.idle = self.parse_secs(value)?,
            ConfigKey::MultiresCachePolicy => {
                let policy: CachePolicy = value.parse().map_err(|_| self.invalid(value))?;
                config.multires.bounded = matches!(policy, CachePolicy::Bounded { .. });
            }
            ConfigKey::MultiresCapacity => {
                config.multires.capacity = match value.parse::<u64>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(self.invalid(value)),
                }
            }
            ConfigKey::MultiresTtlSecs => config.multires.ttl = self.parse_secs(value)?,
            ConfigKey::FontsFallback => {
                if value.is_empty() {
                    return Err(self.invalid(value));
                }
                config.fonts.fallback = value.to_string();
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
        }
    }

    fn parse_tile_size(&self, value: &str) -> Result<u32, ConfigError> {
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.invalid(value)),
        }
    }

    /// Empty or zero disables the timeout.
    fn parse_secs(&self, value: &str) -> Result<Option<Duration>, ConfigError> {
        if value.is_empty() {
            return Ok(None);
        }
        match value.parse::<u64>() {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(Duration::from_secs(n))),
            Err(_) => Err(self.invalid(value)),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = s
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
        Self::lookup(section, key)
    }
}

fn secs_to_string(d: Option<Duration>) -> String {
    d.map(|d| d.as_secs().to_string()).unwrap_or_default()
}

/// Parse a byte size such as `"1048576"`, `"512KB"`, `"256 MB"`, or `"2G"`.
///
/// Units are binary multiples and case-insensitive.
pub fn parse_size(value: &str) -> Option<u64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: u64 = number.parse().ok()?;
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        _ => return None,
    };
    number.checked_mul(multiplier)
}

/// Format a size in bytes as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.tiles.tile_width, 128);
        assert_eq!(config.tiles.tile_height, 128);
        assert_eq!(config.tiles.shared_cache_bytes, 256 * 1024 * 1024);
        assert_eq!(config.multires.cache_policy(), CachePolicy::default());
        assert_eq!(config.fonts.fallback, "SansSerif");
    }

    #[test]
    fn test_parse_full_file() {
        let config = RenderConfig::from_ini_str(
            "[tiles]\n\
             tile_width = 64\n\
             tile_height = 32\n\
             shared_cache_bytes = 16MB\n\
             ttl_secs = 60\n\
             [multires]\n\
             cache_policy = bounded\n\
             capacity = 4\n\
             ttl_secs = 10\n\
             [fonts]\n\
             fallback = Serif\n\
             Helvetica = SansSerif\n",
        )
        .unwrap();

        assert_eq!(config.tiles.tile_width, 64);
        assert_eq!(config.tiles.tile_height, 32);
        assert_eq!(config.tiles.shared_cache_bytes, 16 * 1024 * 1024);
        assert_eq!(config.tiles.ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.tiles.idle, None);
        assert_eq!(
            config.multires.cache_policy(),
            CachePolicy::Bounded {
                capacity: 4,
                ttl: Some(Duration::from_secs(10))
            }
        );

        let fonts = config.font_map();
        assert_eq!(fonts.fallback(), "Serif");
        assert_eq!(fonts.get("Helvetica"), Some("SansSerif"));
        assert_eq!(fonts.get("serif"), Some("Serif"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = RenderConfig::from_ini_str("[tiles]\ncolour = blue\n[other]\nx = 1\n").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_malformed_number_is_error() {
        let err = RenderConfig::from_ini_str("[tiles]\ntile_width = wide\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref section, ref key, .. }
                if section == "tiles" && key == "tile_width"
        ));
        assert!(RenderConfig::from_ini_str("[tiles]\ntile_width = 0\n").is_err());
        assert!(RenderConfig::from_ini_str("[multires]\ncache_policy = soft\n").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RenderConfig::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = RenderConfig::default();
        config.tiles.tile_width = 256;
        config.tiles.idle = Some(Duration::from_secs(30));
        config.multires.bounded = false;
        config
            .fonts
            .overrides
            .insert("Arial".to_string(), "SansSerif".to_string());
        config.save_to(&path).unwrap();

        let loaded = RenderConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_eviction_policy() {
        let mut config = RenderConfig::default();
        config.tiles.shared_cache_bytes = 1000;
        config.tiles.ttl = Some(Duration::from_secs(5));
        let policy = config.eviction_policy();
        assert_eq!(policy.max_bytes, 1000);
        assert_eq!(policy.ttl, Some(Duration::from_secs(5)));
        assert_eq!(policy.idle, None);
    }

    #[test]
    fn test_config_key_parse_and_name() {
        let key: ConfigKey = "tiles.shared_cache_bytes".parse().unwrap();
        assert_eq!(key, ConfigKey::TilesSharedCacheBytes);
        assert_eq!(key.name(), "tiles.shared_cache_bytes");
        assert_eq!(
            "multires.ttl_secs".parse::<ConfigKey>().unwrap(),
            ConfigKey::MultiresTtlSecs
        );
        assert!("tiles".parse::<ConfigKey>().is_err());
        assert!("tiles.nope".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_config_key_get_set() {
        let mut config = RenderConfig::default();
        ConfigKey::TilesTtlSecs.set(&mut config, "90").unwrap();
        assert_eq!(ConfigKey::TilesTtlSecs.get(&config), "90");
        ConfigKey::TilesTtlSecs.set(&mut config, "0").unwrap();
        assert_eq!(ConfigKey::TilesTtlSecs.get(&config), "");
        assert!(ConfigKey::FontsFallback.set(&mut config, " ").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024"), Some(1024));
        assert_eq!(parse_size("512KB"), Some(512 * 1024));
        assert_eq!(parse_size("256 mb"), Some(256 * 1024 * 1024));
        assert_eq!(parse_size("2G"), Some(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size("12 parsecs"), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
    }
}

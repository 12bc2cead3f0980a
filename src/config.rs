use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub thinking: bool,
    pub use_format: bool,
    pub use_cot_caption: bool,
    pub use_cot_language: bool,
    pub audio_format: String,
    pub vocal_language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            thinking: true,
            use_format: true,
            use_cot_caption: true,
            use_cot_language: true,
            audio_format: "mp3".to_string(),
            vocal_language: "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Every settable key, in listing order.
pub const CONFIG_KEYS: [&str; 7] = [
    "api_url",
    "generation.thinking",
    "generation.use_format",
    "generation.use_cot_caption",
    "generation.use_cot_language",
    "generation.audio_format",
    "generation.vocal_language",
];

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads the config at `path`, creating it with defaults if absent.
    /// Missing fields fall back to their defaults; a file that no longer
    /// parses is treated the same as an absent one.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .context("Failed to read config file")?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Writes via a sibling temp file and renames it into place, so readers
    /// never observe a half-written config.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)
            .context("Failed to write config file")?;
        std::fs::rename(&tmp, path).context("Failed to persist config file")?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api_url" => Some(self.api_url.clone()),
            "generation.thinking" => Some(self.generation.thinking.to_string()),
            "generation.use_format" => Some(self.generation.use_format.to_string()),
            "generation.use_cot_caption" => Some(self.generation.use_cot_caption.to_string()),
            "generation.use_cot_language" => Some(self.generation.use_cot_language.to_string()),
            "generation.audio_format" => Some(self.generation.audio_format.clone()),
            "generation.vocal_language" => Some(self.generation.vocal_language.clone()),
            _ => None,
        }
    }

    /// Sets a key by its fully qualified name. Unknown keys and
    /// non-boolean values for boolean keys are rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => self.api_url = value.to_string(),
            "generation.thinking" => self.generation.thinking = parse_bool(key, value)?,
            "generation.use_format" => self.generation.use_format = parse_bool(key, value)?,
            "generation.use_cot_caption" => {
                self.generation.use_cot_caption = parse_bool(key, value)?
            }
            "generation.use_cot_language" => {
                self.generation.use_cot_language = parse_bool(key, value)?
            }
            "generation.audio_format" => self.generation.audio_format = value.to_string(),
            "generation.vocal_language" => self.generation.vocal_language = value.to_string(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Config::default();
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .ok()
        .with_context(|| format!("{} expects true or false, got {:?}", key, value))
}

fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home
        .join(".config")
        .join("acestep-client")
        .join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert!(config.generation.thinking);
        assert!(config.generation.use_format);
        assert!(config.generation.use_cot_caption);
        assert!(config.generation.use_cot_language);
        assert_eq!(config.generation.audio_format, "mp3");
        assert_eq!(config.generation.vocal_language, "unknown");
    }

    #[test]
    fn test_every_key_readable_after_reset() {
        let mut config = Config::default();
        config.set("api_url", "http://elsewhere:9000").unwrap();
        config.set("generation.thinking", "false").unwrap();
        config.reset();

        let defaults = Config::default();
        for key in CONFIG_KEYS {
            assert_eq!(config.get(key), defaults.get(key), "key: {}", key);
        }
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut config = Config::default();

        let cases = [
            ("generation.thinking", "false"),
            ("generation.use_format", "true"),
            ("generation.audio_format", "flac"),
            ("generation.vocal_language", "ja"),
            // Numeric-looking text stays text on string keys.
            ("generation.vocal_language", "1.5"),
            ("api_url", "http://10.0.0.5:8000"),
        ];

        for (key, value) in cases {
            config.set(key, value).unwrap();
            assert_eq!(config.get(key).as_deref(), Some(value), "key: {}", key);
        }
    }

    #[test]
    fn test_set_round_trips_through_disk_with_escaping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let awkward = "Key \"C\"\nmajor\twith \\ backslash\r";
        let mut config = Config::load_from(&path).unwrap();
        config.set("generation.vocal_language", awkward).unwrap();
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(
            reloaded.get("generation.vocal_language").as_deref(),
            Some(awkward)
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut config = Config::default();
        assert!(config.set("generation.volume", "11").is_err());
        assert!(config.get("generation.volume").is_none());
    }

    #[test]
    fn test_bool_key_rejects_non_bool() {
        let mut config = Config::default();
        assert!(config.set("generation.thinking", "maybe").is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_url": "http://gpu-box:8000"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, "http://gpu-box:8000");
        assert_eq!(config.generation.audio_format, "mp3");
        assert!(config.generation.thinking);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        Config::default().save_to(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}

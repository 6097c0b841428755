use anyhow::bail;

use super::structure::{RelayConfigInner, RelayConfigTOML};
use std::{ops::Deref, path::PathBuf};

pub const API_KEY_VAR: &str = "OPENAI_KEY";
pub const MODEL_VAR: &str = "MODEL";

/// Process-wide configuration, read once at startup and only borrowed afterwards.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub path: PathBuf,
    cached: RelayConfigTOML,
}

impl RelayConfig {
    /// Reads the config file at `path` (or `path/config.toml` for a directory), creating it with
    /// defaults when missing, then applies the environment overrides.
    pub fn load(path: PathBuf) -> Result<Self, anyhow::Error> {
        let mut config = Self::read(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn read(path: PathBuf) -> Result<Self, anyhow::Error> {
        let path = match path.is_dir() {
            true => path.join("config.toml"),
            false => path,
        };

        if !path.exists() {
            return Self::new(path);
        }

        if !path.is_file() {
            bail!(
                "Given path exists and is not a file... either change the path or delete the file."
            );
        }

        let config_str = std::fs::read_to_string(&path)?;
        let config = Self {
            path,
            cached: toml::from_str(&config_str)?,
        };

        if config.chat.max_messages == 0 {
            bail!("chat.max_messages must be greater than zero");
        }

        Ok(config)
    }

    /// `OPENAI_KEY` replaces the API key and `MODEL` the model, when set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let llm = &mut self.cached.config.llm;

        if let Some(api_key) = lookup(API_KEY_VAR) {
            llm.api_key = api_key;
        }
        if let Some(model) = lookup(MODEL_VAR).filter(|model| !model.is_empty()) {
            llm.model = model;
        }
    }

    fn new(path: PathBuf) -> Result<Self, anyhow::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config = Self {
            path,
            cached: RelayConfigTOML::default(),
        };

        config.save()?;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        std::fs::write(&self.path, toml::to_string(&self.cached)?)?;

        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.toml"),
            cached: RelayConfigTOML::default(),
        }
    }
}

impl From<RelayConfigInner> for RelayConfig {
    fn from(config: RelayConfigInner) -> Self {
        Self {
            cached: RelayConfigTOML { config },
            ..Default::default()
        }
    }
}

impl Deref for RelayConfig {
    type Target = RelayConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.cached.config
    }
}

impl PartialEq for RelayConfig {
    fn eq(&self, other: &Self) -> bool {
        self.cached.config == other.cached.config
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Scope lives in souvenir_core so the memory crate does not depend on config
use souvenir_core::MemoryScope;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub documents: DocumentConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "GenerationConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "GenerationConfig::default_model")]
    pub model: String,
    #[serde(default = "GenerationConfig::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "GenerationConfig::default_temperature")]
    pub temperature: f32,
    #[serde(default = "GenerationConfig::default_top_p")]
    pub top_p: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            api_key: None,
            model: Self::default_model(),
            max_tokens: Self::default_max_tokens(),
            temperature: Self::default_temperature(),
            top_p: Self::default_top_p(),
            system_prompt: None,
        }
    }
}

impl GenerationConfig {
    fn default_endpoint() -> String {
        "http://localhost:8080/v1".to_string()
    }

    fn default_model() -> String {
        "mlx-community/Qwen2.5-VL-3B-Instruct-8bit".to_string()
    }

    const fn default_max_tokens() -> u32 {
        250
    }

    const fn default_temperature() -> f32 {
        0.7
    }

    const fn default_top_p() -> f32 {
        0.9
    }

    /// Configured system prompt, or the built-in French assistant prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(souvenir_core::DEFAULT_SYSTEM_PROMPT)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackendKind {
    /// One JSON file per record.
    #[default]
    Json,
    /// Rows in the `conversation_memories` table.
    Database,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    #[serde(default = "MemoryConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub scope: MemoryScope,
    #[serde(default)]
    pub backend: MemoryBackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// JSON pattern library replacing the built-in French one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            scope: MemoryScope::default(),
            backend: MemoryBackendKind::default(),
            directory: None,
            patterns: None,
        }
    }
}

impl MemoryConfig {
    const fn default_enabled() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Database URL; defaults to a SQLite file in the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentConfig {
    /// Characters of extracted PDF text kept before truncation.
    #[serde(default = "DocumentConfig::default_max_chars")]
    pub max_chars: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_chars: Self::default_max_chars(),
        }
    }
}

impl DocumentConfig {
    const fn default_max_chars() -> usize {
        8000
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    /// Past messages rendered into the prompt.
    #[serde(default = "HistoryConfig::default_max_turns")]
    pub max_turns: usize,
    /// Character budget for rendered history.
    #[serde(default = "HistoryConfig::default_max_chars")]
    pub max_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: Self::default_max_turns(),
            max_chars: Self::default_max_chars(),
        }
    }
}

impl HistoryConfig {
    const fn default_max_turns() -> usize {
        10
    }

    const fn default_max_chars() -> usize {
        6000
    }
}

impl Config {
    pub fn data_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("souvenir"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::data_dir()?.join("config.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'souvenir init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_data_dir() -> anyhow::Result<PathBuf> {
        let data_dir = Self::data_dir()?;
        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    /// Directory holding the JSON memory files.
    pub fn memory_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.memory.directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("memories")),
        }
    }

    pub fn database_url(&self) -> anyhow::Result<String> {
        match &self.database.url {
            Some(url) => Ok(url.clone()),
            None => Ok(format!(
                "sqlite://{}?mode=rwc",
                Self::data_dir()?.join("souvenir.db").display()
            )),
        }
    }

    pub fn create_config() -> anyhow::Result<()> {
        let data_dir = Self::ensure_data_dir()?;
        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, Self::template())?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Point generation.endpoint at your model server");
        println!("   2. Run 'souvenir chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - memory.scope: 'conversation' (one memory per conversation) or 'global'");
        println!("   - memory.backend: 'json' (files) or 'database' (conversation_memories table)");
        println!("   - documents.max_chars: PDF text kept before truncation");
        println!();
        Ok(())
    }

    const fn template() -> &'static str {
        r#"{
  "generation": {
    "endpoint": "http://localhost:8080/v1",
    "model": "mlx-community/Qwen2.5-VL-3B-Instruct-8bit",
    "max_tokens": 250,
    "temperature": 0.7,
    "top_p": 0.9
  },
  "memory": {
    "enabled": true,
    "scope": "conversation",
    "backend": "json"
  },
  "database": {},
  "documents": {
    "max_chars": 8000
  },
  "history": {
    "max_turns": 10,
    "max_chars": 6000
  }
}"#
    }
}

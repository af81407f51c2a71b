//! Configuration loading and validation.
//!
//! Secrets come from the environment (optionally seeded from a `.env` file by
//! the binary). Everything else has a built-in default and can be overridden
//! from an optional TOML file.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PERSONA_NAME: &str = "Cobie";
pub const DEFAULT_EXAMPLES_PATH: &str = "finetune_cobie.jsonl";
pub const DEFAULT_CHARACTER_PATH: &str = "cobie.character.json";
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://openrouter.ai/api/v1/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PUBLISH_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_TWITTER_ENDPOINT: &str = "https://api.twitter.com/2/tweets";

/// cobiebot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub persona: PersonaConfig,
    pub knowledge: KnowledgeConfig,
    pub discord: DiscordConfig,
    pub completion: CompletionConfig,
    pub publisher: PublisherConfig,
    /// X credentials. Always present when the publisher is enabled.
    pub twitter: Option<TwitterConfig>,
}

/// Persona identity.
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    /// Literal name token that triggers a reply and fills the prompt template.
    pub name: String,
}

/// Knowledge base source files.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Line-delimited JSON, one `{"text": ...}` object per line.
    pub examples_path: PathBuf,
    /// Character profile with message and post examples.
    pub character_path: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            examples_path: PathBuf::from(DEFAULT_EXAMPLES_PATH),
            character_path: PathBuf::from(DEFAULT_CHARACTER_PATH),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
}

/// Completion endpoint settings. Sampling parameters are fixed in `llm`.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct PublisherConfig {
    pub enabled: bool,
    pub interval: Duration,
}

/// OAuth 1.0a user-context credentials for the X API.
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

/// On-disk TOML shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    persona: PersonaSection,
    knowledge: KnowledgeSection,
    completion: CompletionSection,
    publisher: PublisherSection,
    twitter: TwitterSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PersonaSection {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct KnowledgeSection {
    examples: Option<PathBuf>,
    character: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CompletionSection {
    endpoint: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PublisherSection {
    enabled: Option<bool>,
    interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TwitterSection {
    endpoint: Option<String>,
}

impl Config {
    /// Load configuration from the process environment only.
    pub fn load() -> Result<Self> {
        Self::from_sources(None, env_var)
    }

    /// Load from a TOML file, with secrets still taken from the environment.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|error| ConfigError::Load {
            path: path.display().to_string(),
            source: Arc::new(error),
        })?;
        let file = parse_file(&contents, &path.display().to_string())?;
        Self::build(file, env_var)
    }

    /// Build a config from optional TOML text and an environment lookup.
    pub fn from_sources(
        toml_text: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = match toml_text {
            Some(text) => parse_file(text, "<inline>")?,
            None => ConfigFile::default(),
        };
        Self::build(file, lookup)
    }

    fn build(file: ConfigFile, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).ok_or_else(|| ConfigError::MissingKey(key.into()).into())
        };

        let persona_name = file
            .persona
            .name
            .unwrap_or_else(|| DEFAULT_PERSONA_NAME.into());
        if persona_name.is_empty() {
            return Err(ConfigError::Invalid("persona.name must not be empty".into()).into());
        }

        let defaults = KnowledgeConfig::default();
        let knowledge = KnowledgeConfig {
            examples_path: file.knowledge.examples.unwrap_or(defaults.examples_path),
            character_path: file.knowledge.character.unwrap_or(defaults.character_path),
        };

        let timeout_secs = file
            .completion
            .timeout_secs
            .unwrap_or(DEFAULT_COMPLETION_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid("completion.timeout_secs must be > 0".into()).into());
        }

        let interval_secs = file
            .publisher
            .interval_secs
            .unwrap_or(DEFAULT_PUBLISH_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(ConfigError::Invalid("publisher.interval_secs must be > 0".into()).into());
        }
        let publisher = PublisherConfig {
            enabled: file.publisher.enabled.unwrap_or(true),
            interval: Duration::from_secs(interval_secs),
        };

        let discord = DiscordConfig {
            token: required("DISCORD_TOKEN")?,
        };

        let completion = CompletionConfig {
            endpoint: file
                .completion
                .endpoint
                .unwrap_or_else(|| DEFAULT_COMPLETION_ENDPOINT.into()),
            api_key: required("OPENROUTER_API_KEY")?,
            model: file
                .completion
                .model
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.into()),
            timeout: Duration::from_secs(timeout_secs),
        };

        // X credentials only matter when something is going to post.
        let twitter = if publisher.enabled {
            Some(TwitterConfig {
                endpoint: file
                    .twitter
                    .endpoint
                    .unwrap_or_else(|| DEFAULT_TWITTER_ENDPOINT.into()),
                api_key: required("API_KEY")?,
                api_secret: required("API_SECRET_KEY")?,
                access_token: required("ACCESS_TOKEN")?,
                access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            })
        } else {
            None
        };

        Ok(Self {
            persona: PersonaConfig { name: persona_name },
            knowledge,
            discord,
            completion,
            publisher,
            twitter,
        })
    }
}

fn parse_file(contents: &str, path: &str) -> Result<ConfigFile> {
    toml::from_str(contents).map_err(|error| {
        ConfigError::Parse {
            path: path.to_string(),
            message: error.to_string(),
        }
        .into()
    })
}

/// Environment lookup that treats empty values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

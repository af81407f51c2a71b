//! Knowledge base: example posts and the character profile.
//!
//! Loaded once at startup and shared read-only as `Arc<KnowledgeBase>`.
//! Loading never fails: each source degrades to its own default.

use crate::config::KnowledgeConfig;

use anyhow::Context as _;
use rand::Rng;
use rand::seq::IndexedRandom as _;
use serde::Deserialize;
use std::path::Path;

/// Placeholder used when the examples file is missing, unreadable or empty.
pub const FALLBACK_COMPLETION_EXAMPLE: &str = "Fallback prompt text for the persona.";

/// One example exchange from the character profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DialogueExample {
    pub prompt: String,
    pub response: String,
}

impl std::fmt::Display for DialogueExample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.prompt, self.response)
    }
}

/// Character profile file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    #[serde(rename = "message examples", alias = "messageExamples")]
    pub message_examples: Vec<DialogueExample>,
    #[serde(rename = "post examples", alias = "postExamples")]
    pub post_examples: Vec<DialogueExample>,
}

#[derive(Debug, Deserialize)]
struct ExampleLine {
    text: String,
}

/// Immutable knowledge shared by the relay and the publisher.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    completion_examples: Vec<String>,
    character: CharacterProfile,
}

impl KnowledgeBase {
    /// Build from already-parsed parts. An empty example list is replaced by
    /// the placeholder so sampling always has something to pick.
    pub fn new(completion_examples: Vec<String>, character: CharacterProfile) -> Self {
        let completion_examples = if completion_examples.is_empty() {
            vec![FALLBACK_COMPLETION_EXAMPLE.to_string()]
        } else {
            completion_examples
        };
        Self {
            completion_examples,
            character,
        }
    }

    /// Load both sources, degrading each independently on failure.
    pub async fn load(config: &KnowledgeConfig) -> Self {
        let completion_examples = match load_completion_examples(&config.examples_path).await {
            Ok(examples) if examples.is_empty() => {
                tracing::warn!(
                    path = %config.examples_path.display(),
                    "examples file has no entries, using fallback prompt"
                );
                Vec::new()
            }
            Ok(examples) => {
                tracing::info!(
                    path = %config.examples_path.display(),
                    count = examples.len(),
                    "loaded completion examples"
                );
                examples
            }
            Err(error) => {
                tracing::warn!(
                    path = %config.examples_path.display(),
                    error = %format!("{error:#}"),
                    "failed to load completion examples, using fallback prompt"
                );
                Vec::new()
            }
        };

        let character = match load_character(&config.character_path).await {
            Ok(character) => {
                tracing::info!(
                    path = %config.character_path.display(),
                    message_examples = character.message_examples.len(),
                    post_examples = character.post_examples.len(),
                    "loaded character profile"
                );
                character
            }
            Err(error) => {
                tracing::warn!(
                    path = %config.character_path.display(),
                    error = %format!("{error:#}"),
                    "failed to load character profile, using empty examples"
                );
                CharacterProfile::default()
            }
        };

        Self::new(completion_examples, character)
    }

    pub fn completion_examples(&self) -> &[String] {
        &self.completion_examples
    }

    pub fn message_examples(&self) -> &[DialogueExample] {
        &self.character.message_examples
    }

    pub fn post_examples(&self) -> &[DialogueExample] {
        &self.character.post_examples
    }

    /// Uniformly pick one completion example.
    pub fn sample_completion_example<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.completion_examples
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COMPLETION_EXAMPLE)
    }

    /// Uniformly pick one message example, if there are any.
    pub fn sample_message_example<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&DialogueExample> {
        self.character.message_examples.choose(rng)
    }
}

async fn load_completion_examples(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_completion_examples(&contents)
}

fn parse_completion_examples(contents: &str) -> anyhow::Result<Vec<String>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<ExampleLine>(line)
                .map(|example| example.text)
                .with_context(|| format!("invalid example on line {}", index + 1))
        })
        .collect()
}

async fn load_character(path: &Path) -> anyhow::Result<CharacterProfile> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).context("invalid character profile")
}

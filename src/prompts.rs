//! Reply prompt composition.
//!
//! Each call samples a fresh example post and example dialogue from the
//! knowledge base and renders them, with the user's message, into the
//! persona template.

use crate::error::Result;
use crate::knowledge::KnowledgeBase;

use anyhow::Context as _;
use minijinja::{Environment, context};
use rand::Rng;
use std::sync::Arc;

/// Used in place of a dialogue example when the character has none.
pub const FALLBACK_DIALOGUE: &str = "Fallback message example.";

const REPLY_TEMPLATE_NAME: &str = "reply";
const REPLY_TEMPLATE: &str = include_str!("../prompts/reply.md.j2");

pub struct PromptComposer {
    knowledge: Arc<KnowledgeBase>,
    persona_name: String,
    environment: Environment<'static>,
}

impl std::fmt::Debug for PromptComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptComposer")
            .field("persona_name", &self.persona_name)
            .finish_non_exhaustive()
    }
}

impl PromptComposer {
    pub fn new(knowledge: Arc<KnowledgeBase>, persona_name: impl Into<String>) -> Result<Self> {
        let mut environment = Environment::new();
        environment
            .add_template(REPLY_TEMPLATE_NAME, REPLY_TEMPLATE)
            .context("failed to parse reply prompt template")?;

        Ok(Self {
            knowledge,
            persona_name: persona_name.into(),
            environment,
        })
    }

    /// Build a reply prompt for `user_message` using the thread-local RNG.
    pub fn compose(&self, user_message: &str) -> Result<String> {
        self.compose_with(&mut rand::rng(), user_message)
    }

    pub fn compose_with<R: Rng + ?Sized>(&self, rng: &mut R, user_message: &str) -> Result<String> {
        let example = self.knowledge.sample_completion_example(rng).trim();
        let dialogue = self
            .knowledge
            .sample_message_example(rng)
            .map(ToString::to_string)
            .unwrap_or_else(|| FALLBACK_DIALOGUE.to_string());

        let template = self
            .environment
            .get_template(REPLY_TEMPLATE_NAME)
            .context("reply prompt template missing")?;

        let prompt = template
            .render(context! {
                name => &self.persona_name,
                example => example,
                dialogue => dialogue,
                message => user_message,
            })
            .context("failed to render reply prompt")?;

        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{CharacterProfile, DialogueExample};

    fn dialogue(prompt: &str, response: &str) -> DialogueExample {
        DialogueExample {
            prompt: prompt.into(),
            response: response.into(),
        }
    }

    fn composer(examples: &[&str], dialogues: Vec<DialogueExample>) -> PromptComposer {
        let knowledge = KnowledgeBase::new(
            examples.iter().map(|e| e.to_string()).collect(),
            CharacterProfile {
                message_examples: dialogues,
                post_examples: Vec::new(),
            },
        );
        PromptComposer::new(Arc::new(knowledge), "Cobie").expect("template should parse")
    }

    #[test]
    fn contains_message_and_exactly_one_of_each_example() {
        let examples = ["post-alpha", "post-bravo", "post-charlie"];
        let dialogues = vec![
            dialogue("ask-one", "answer-one"),
            dialogue("ask-two", "answer-two"),
        ];
        let composer = composer(&examples, dialogues.clone());

        for _ in 0..50 {
            let prompt = composer.compose("is it time to sell?").expect("renders");

            assert!(prompt.contains("User: is it time to sell?"));
            assert_eq!(examples.iter().filter(|e| prompt.contains(*e)).count(), 1);
            assert_eq!(
                dialogues
                    .iter()
                    .filter(|d| prompt.contains(&d.to_string()))
                    .count(),
                1
            );
        }
    }

    #[test]
    fn renders_persona_framing_and_open_cue() {
        let composer = composer(&["  gm  "], vec![dialogue("wen", "soon")]);
        let prompt = composer.compose("hello").expect("renders");

        assert_eq!(
            prompt,
            "You are Cobie, a crypto influencer known for your sharp wit, humor, and sarcasm. \
             Your responses are sharp, sarcastic, and unapologetically direct.\n\n\
             Example tweet:\ngm\n\n\
             Example dialogue:\nwen -> soon\n\n\
             User: hello\n\
             Cobie's response:"
        );
    }

    #[test]
    fn empty_dialogues_use_fallback() {
        let composer = composer(&["gm"], Vec::new());
        let prompt = composer.compose("hello").expect("renders");

        assert!(prompt.contains(FALLBACK_DIALOGUE));
        assert!(prompt.contains("User: hello"));
    }

    #[test]
    fn user_text_is_not_escaped() {
        let composer = composer(&["gm"], Vec::new());
        let prompt = composer.compose("<b>\"quotes\" & stuff</b>").expect("renders");

        assert!(prompt.contains("User: <b>\"quotes\" & stuff</b>"));
    }
}

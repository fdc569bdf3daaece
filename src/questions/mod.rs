//! Interview question source.
//!
//! The question list is fixed for the lifetime of a session: ordered,
//! index-addressed and read-only. A custom set can be supplied via a TOML
//! file in the config directory; otherwise the built-in set is used.

use crate::global;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A single interview question with its spoken prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    /// Reference to the audio clip that reads the question aloud.
    pub audio_prompt: String,
}

/// Ordered, immutable list of interview questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            bail!("Question set must contain at least one question");
        }
        Ok(Self { questions })
    }

    /// Load the question set from the config dir, falling back to the
    /// built-in questions when no file is present.
    pub fn load() -> Result<Self> {
        let path = global::questions_file()?;
        if !path.exists() {
            return Ok(Self::builtin());
        }

        let content =
            std::fs::read_to_string(&path).context("Failed to read questions file")?;
        let set: Self = toml::from_str(&content).context("Failed to parse questions file")?;

        if set.questions.is_empty() {
            bail!("Questions file {:?} contains no questions", path);
        }

        info!("Loaded {} questions from {:?}", set.questions.len(), path);
        Ok(set)
    }

    pub fn builtin() -> Self {
        let prompts = [
            "Tell me about yourself.",
            "What are your strengths?",
            "What are your weaknesses?",
            "Why do you want to work here?",
            "Where do you see yourself in five years?",
            "Why should we hire you?",
            "Describe a challenging situation you faced and how you handled it.",
            "What do you know about this company?",
            "What is your greatest achievement?",
            "Do you have any questions for us?",
        ];

        let questions = prompts
            .iter()
            .enumerate()
            .map(|(i, prompt)| Question {
                prompt: prompt.to_string(),
                audio_prompt: format!("voices/question/{}.mp3", i + 1),
            })
            .collect();

        Self { questions }
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_has_ten_questions() {
        let set = QuestionSet::builtin();
        assert_eq!(set.len(), 10);
        assert_eq!(set.get(0).unwrap().prompt, "Tell me about yourself.");
        assert_eq!(
            set.get(9).unwrap().prompt,
            "Do you have any questions for us?"
        );
    }

    #[test]
    fn test_audio_prompts_are_one_indexed() {
        let set = QuestionSet::builtin();
        assert_eq!(set.get(0).unwrap().audio_prompt, "voices/question/1.mp3");
        assert_eq!(set.get(9).unwrap().audio_prompt, "voices/question/10.mp3");
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(QuestionSet::new(Vec::new()).is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let set = QuestionSet::builtin();
        assert!(set.get(10).is_none());
    }
}

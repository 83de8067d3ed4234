// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive answer collection.
//!
//! Commands that need input from the user ask for it through [`Prompter`],
//! so the terminal can be swapped out for scripted answers.

use inquire::{validator::Validation, Text};
use tracing::instrument;

/// Single question to ask the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub message: String,
    pub default: Option<String>,
    pub required: bool,
}

impl Question {
    /// Construct new question without a default answer.
    pub fn new(message: impl Into<String>, required: bool) -> Self {
        Self {
            message: message.into(),
            default: None,
            required,
        }
    }

    /// Give question a default answer.
    ///
    /// Blank defaults count as no default at all.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        let default = default.into();
        self.default = (!default.trim().is_empty()).then_some(default);
        self
    }
}

/// Source of answers to questions.
pub trait Prompter {
    /// Ask question, and hand back the raw answer.
    ///
    /// # Errors
    ///
    /// - Return [`PromptError`] if no answer could be obtained.
    fn ask(&mut self, question: &Question) -> Result<String>;

    /// Ask question, falling back to its default on a blank answer.
    ///
    /// # Errors
    ///
    /// - Return [`PromptError`] if no answer could be obtained.
    fn answer(&mut self, question: &Question) -> Result<String> {
        let answer = self.ask(question)?;
        match (answer.trim().is_empty(), &question.default) {
            (true, Some(default)) => Ok(default.clone()),
            _ => Ok(answer.trim().to_string()),
        }
    }
}

/// Prompter that asks through the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    #[instrument(skip(self), level = "debug")]
    fn ask(&mut self, question: &Question) -> Result<String> {
        let mut text = Text::new(&question.message);
        if let Some(default) = question.default.as_deref() {
            text = text.with_default(default);
        }
        if question.required {
            text = text.with_validator(|input: &str| match input.trim().is_empty() {
                true => Ok(Validation::Invalid("an answer is required".into())),
                false => Ok(Validation::Valid),
            });
        }

        Ok(text.prompt()?)
    }
}

/// Prompting error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Terminal prompt failed or was cancelled.
    #[error(transparent)]
    Inquire(#[from] inquire::InquireError),

    /// Scripted answers ran out.
    #[error("no answer left for {0:?}")]
    Exhausted(String),
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;

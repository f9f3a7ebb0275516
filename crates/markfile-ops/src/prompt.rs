//! Blocking user-interaction protocol.
//!
//! The engine never draws anything itself. It asks a [`Prompter`] to pick
//! one of a few labelled choices, to type a line of text, or to show a
//! message, and blocks until the answer comes back.

use std::collections::VecDeque;

use strum::{Display, EnumIter, FromRepr, IntoEnumIterator};

/// Host-side implementation of the confirmation and text-input calls.
pub trait Prompter {
    /// Pick one of `choices` (2 or 3 labels). Returns the chosen index.
    fn confirm(&mut self, prompt: &str, choices: &[&str], default: usize) -> usize;

    /// Ask for a line of text. An empty answer means cancel.
    fn input(&mut self, prompt: &str, prefill: &str) -> String;

    /// Show a message (an item error, a diff line) without waiting.
    fn report(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn confirm(&mut self, prompt: &str, choices: &[&str], default: usize) -> usize {
        (**self).confirm(prompt, choices, default)
    }

    fn input(&mut self, prompt: &str, prefill: &str) -> String {
        (**self).input(prompt, prefill)
    }

    fn report(&mut self, message: &str) {
        (**self).report(message)
    }
}

/// A closed set of prompt answers.
pub trait Choice: Copy + std::fmt::Display + IntoEnumIterator {
    /// Map a prompt index back to the answer.
    fn from_index(index: usize) -> Option<Self>;

    /// Position of this answer in the prompt.
    fn index(self) -> usize;
}

macro_rules! impl_choice {
    ($($ty:ty),*) => {
        $(
            impl Choice for $ty {
                fn from_index(index: usize) -> Option<Self> {
                    Self::from_repr(index)
                }

                fn index(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

/// Answer to a destination conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(usize)]
pub enum OverwriteChoice {
    Overwrite,
    Skip,
    Rename,
}

/// Answer to a plain yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(usize)]
pub enum YesNo {
    Yes,
    No,
}

/// Answer to a bulk-rename commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(usize)]
pub enum CommitChoice {
    Yes,
    No,
    Diff,
}

impl_choice!(OverwriteChoice, YesNo, CommitChoice);

impl YesNo {
    /// Build from a boolean default.
    pub fn from_bool(yes: bool) -> Self {
        if yes { Self::Yes } else { Self::No }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

/// Ask a typed question.
///
/// An out-of-range index from the host falls back to `default`.
pub fn ask<C: Choice, P: Prompter + ?Sized>(prompter: &mut P, prompt: &str, default: C) -> C {
    let labels: Vec<String> = C::iter().map(|choice| choice.to_string()).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    let index = prompter.confirm(prompt, &labels, default.index());
    C::from_index(index).unwrap_or(default)
}

/// Prompter that always takes the default and cancels text input.
///
/// Used by non-interactive front ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrompter;

impl Prompter for DefaultPrompter {
    fn confirm(&mut self, prompt: &str, _choices: &[&str], default: usize) -> usize {
        tracing::debug!(prompt, default, "answering with default");
        default
    }

    fn input(&mut self, prompt: &str, _prefill: &str) -> String {
        tracing::debug!(prompt, "cancelling text input");
        String::new()
    }
}

/// Prompter that replays queued answers.
///
/// Choices are matched by label, case-insensitively. When the queue runs
/// dry, or a label is not among the offered choices, the default is taken.
/// Every prompt and report is recorded for later inspection.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    choices: VecDeque<String>,
    inputs: VecDeque<String>,
    /// Prompts shown, in order.
    pub prompts: Vec<String>,
    /// Messages reported, in order.
    pub reports: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a choice by its label.
    pub fn choose(mut self, label: impl Into<String>) -> Self {
        self.choices.push_back(label.into());
        self
    }

    /// Queue a text answer.
    pub fn type_text(mut self, text: impl Into<String>) -> Self {
        self.inputs.push_back(text.into());
        self
    }

    /// Number of queued answers not yet consumed.
    pub fn pending(&self) -> usize {
        self.choices.len() + self.inputs.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, prompt: &str, choices: &[&str], default: usize) -> usize {
        self.prompts.push(prompt.to_string());
        let Some(label) = self.choices.pop_front() else {
            return default;
        };
        choices
            .iter()
            .position(|choice| choice.eq_ignore_ascii_case(&label))
            .unwrap_or(default)
    }

    fn input(&mut self, prompt: &str, _prefill: &str) -> String {
        self.prompts.push(prompt.to_string());
        self.inputs.pop_front().unwrap_or_default()
    }

    fn report(&mut self, message: &str) {
        self.reports.push(message.to_string());
    }
}

//! Prompts on the controlling terminal.

use std::io::{self, BufRead, Write};

use markfile_ops::Prompter;

/// Asks questions on stderr and reads answers from stdin.
///
/// End of input answers every question with its default.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str, choices: &[&str], default: usize) -> usize {
        let labels: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, label)| {
                if i == default {
                    format!("[{label}]")
                } else {
                    label.to_string()
                }
            })
            .collect();

        loop {
            eprint!("{prompt} {} ", labels.join("/"));
            let _ = io::stderr().flush();

            let Some(answer) = self.read_line() else {
                eprintln!();
                return default;
            };
            if answer.is_empty() {
                return default;
            }
            if let Some(index) = match_choice(choices, &answer) {
                return index;
            }
            eprintln!("Please answer one of: {}", choices.join(", "));
        }
    }

    fn input(&mut self, prompt: &str, prefill: &str) -> String {
        eprintln!("  current: {prefill}");
        eprint!("{prompt}");
        let _ = io::stderr().flush();
        self.read_line().unwrap_or_default()
    }

    fn report(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Match a typed answer against the labels, by full label or first letter.
fn match_choice(choices: &[&str], answer: &str) -> Option<usize> {
    choices
        .iter()
        .position(|label| label.eq_ignore_ascii_case(answer))
        .or_else(|| {
            let mut chars = answer.chars();
            let first = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            choices.iter().position(|label| {
                label
                    .chars()
                    .next()
                    .is_some_and(|c| c.eq_ignore_ascii_case(&first))
            })
        })
}

//! Interactive questions asked while deleting.
//!
//! [`Prompter`] separates the questions from the terminal so the delete
//! flow can be driven by scripted answers in tests.

use std::fmt;

use gcalcl_core::DateRange;

use crate::error::{ClientError, ClientResult};

/// Source of answers to interactive questions.
pub trait Prompter {
    /// Shows `message` and returns the user's answer.
    fn ask(&mut self, message: &str) -> ClientResult<String>;

    /// Shows an informational line.
    fn say(&mut self, line: &str);
}

/// Prompter reading from the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, message: &str) -> ClientResult<String> {
        Ok(inquire::Text::new(message).prompt()?)
    }

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// What to do with a recurring series matched for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteChoice {
    /// Delete the instances inside the requested range.
    Range,
    /// Delete the whole series.
    Series,
    /// Delete the instances after the requested range's end.
    Following,
    /// Keep the series.
    Abort,
}

impl DeleteChoice {
    /// Interprets an answer to the menu.
    ///
    /// Returns `Ok(None)` for integers outside 1-4 and an error for
    /// anything that is not an integer.
    pub fn parse(answer: &str) -> ClientResult<Option<Self>> {
        let trimmed = answer.trim();
        let number: i64 = trimmed
            .parse()
            .map_err(|_| ClientError::InvalidSelection(trimmed.to_string()))?;
        Ok(match number {
            1 => Some(Self::Range),
            2 => Some(Self::Series),
            3 => Some(Self::Following),
            4 => Some(Self::Abort),
            _ => None,
        })
    }
}

/// The menu shown for a recurring series, with the bounds of the range the
/// user asked for.
#[derive(Debug, Clone)]
pub struct DeleteMenu<'a> {
    title: &'a str,
    range: &'a DateRange,
}

impl<'a> DeleteMenu<'a> {
    /// Creates the menu for the series `title` matched in `range`.
    pub fn new(title: &'a str, range: &'a DateRange) -> Self {
        Self { title, range }
    }
}

impl fmt::Display for DeleteMenu<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.range.start_bound().unwrap_or("the dawn of time");
        let end = self.range.end_bound().unwrap_or("the distant future");
        // Choice 3 deletes from where `following()` starts.
        let following = self.range.following();
        let after = following.start_bound().unwrap_or("the dawn of time");
        writeln!(f, "Delete \"{}\"?", self.title)?;
        writeln!(f, "1) Instances between {} and {}", start, end)?;
        writeln!(f, "2) All events in this series")?;
        writeln!(f, "3) All events following {}", after)?;
        write!(f, "4) Do not delete")
    }
}

/// Shows the menu and asks until a choice from 1 to 4 is given.
///
/// Out-of-range numbers ask again; non-numeric answers are an error.
pub fn choose_delete(prompter: &mut dyn Prompter, menu: &DeleteMenu<'_>) -> ClientResult<DeleteChoice> {
    prompter.say(&menu.to_string());
    loop {
        let answer = prompter.ask("Choice [1-4]:")?;
        match DeleteChoice::parse(&answer)? {
            Some(choice) => return Ok(choice),
            None => prompter.say("Please enter 1, 2, 3 or 4."),
        }
    }
}

/// Asks a yes/no question. Only `y` or `yes` (any case) confirm; an empty
/// answer yields `default`.
pub fn confirm(prompter: &mut dyn Prompter, message: &str, default: bool) -> ClientResult<bool> {
    let answer = prompter.ask(message)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(default);
    }
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Prompter answering from a fixed script, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
    pub said: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, message: &str) -> ClientResult<String> {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| ClientError::Prompt("script exhausted".into()))
    }

    fn say(&mut self, line: &str) {
        self.said.push(line.to_string());
    }
}

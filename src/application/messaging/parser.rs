//! Input parser - Turns chat text into command invocations

use crate::application::errors::ParseError;
use crate::domain::entities::Input;

/// Default trigger character marking a command
pub const DEFAULT_TRIGGER: char = '!';

/// Parses `!name arg arg\nbody\nbody` text into an [`Input`]
#[derive(Debug, Clone, Copy)]
pub struct InputParser {
    trigger: char,
}

impl InputParser {
    pub fn new(trigger: char) -> Self {
        Self { trigger }
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    /// Parse a raw message.
    ///
    /// Runs of spaces on the command line collapse into one separator, so
    /// `!learn  my   cmd` has the arguments `["my", "cmd"]` and the raw
    /// command line `learn my cmd`. The command name must follow the trigger
    /// directly.
    pub fn parse(&self, text: &str) -> Result<Input, ParseError> {
        let mut chars = text.chars();
        if chars.next() != Some(self.trigger) || chars.next().is_none() {
            return Err(ParseError::NotACommand);
        }

        let mut lines = text.split('\n');
        let first = lines.next().unwrap_or_default();
        let body: Vec<String> = lines.map(str::to_string).collect();

        let command_line = first[self.trigger.len_utf8()..].to_lowercase();
        if command_line.starts_with(' ') {
            return Err(ParseError::NotACommand);
        }

        let mut words = command_line.split(' ').filter(|w| !w.is_empty());
        let command = match words.next() {
            Some(name) => name.to_string(),
            None => return Err(ParseError::NotACommand),
        };
        let args: Vec<String> = words.map(str::to_string).collect();

        let command_raw = if args.is_empty() {
            command.clone()
        } else {
            format!("{} {}", command, args.join(" "))
        };

        Ok(Input {
            command,
            command_raw,
            args,
            lines: body,
        })
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER)
    }
}

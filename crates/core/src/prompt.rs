//! Interactive credential acquisition.

use crate::credentials::{CredentialError, Credentials, Field};
use dialoguer::console::Term;
use dialoguer::{Input, Password};
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;

/// Source of interactive answers.
pub trait CredentialPrompt {
    /// Reads a visible value.
    fn read_value(&mut self, field: Field) -> io::Result<String>;

    /// Reads a value without echoing it.
    fn read_secret(&mut self, field: Field) -> io::Result<String>;
}

/// Prompts on a terminal, masking the password.
///
/// When either end is not a terminal (piped input, CI) each answer is read as
/// one line from stdin instead.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new(term: Term) -> Self {
        Self { term }
    }

    pub fn stdout() -> Self {
        Self::new(Term::stdout())
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term() && io::stdin().is_terminal()
    }

    fn read_line(&self, field: Field) -> io::Result<String> {
        LinePrompt::new(io::stdin().lock(), &self.term).read_value(field)
    }

    /// Blocks until a key is pressed. Returns at once without a terminal.
    pub fn wait_for_key(&self) -> io::Result<()> {
        if !self.is_interactive() {
            return Ok(());
        }
        self.term.write_line("\nPress any key to exit...")?;
        self.term.read_key().map(|_| ())
    }
}

fn prompt_text(field: Field) -> String {
    format!("Enter {}", field.name())
}

impl CredentialPrompt for TerminalPrompt {
    fn read_value(&mut self, field: Field) -> io::Result<String> {
        if !self.is_interactive() {
            return self.read_line(field);
        }
        Input::<String>::new()
            .with_prompt(prompt_text(field))
            .allow_empty(true)
            .interact_text_on(&self.term)
            .map_err(io::Error::other)
    }

    fn read_secret(&mut self, field: Field) -> io::Result<String> {
        if !self.is_interactive() {
            return self.read_line(field);
        }
        Password::new()
            .with_prompt(prompt_text(field))
            .allow_empty_password(true)
            .interact_on(&self.term)
            .map_err(io::Error::other)
    }
}

/// Reads one answer per line from `input`, writing the prompt to `output`.
///
/// Nothing can be masked here; the secret is read like any other line.
#[derive(Debug)]
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn next_line(&mut self, field: Field) -> io::Result<String> {
        write!(self.output, "{}: ", prompt_text(field))?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> CredentialPrompt for LinePrompt<R, W> {
    fn read_value(&mut self, field: Field) -> io::Result<String> {
        self.next_line(field)
    }

    fn read_secret(&mut self, field: Field) -> io::Result<String> {
        self.next_line(field)
    }
}

/// Asks for broker, username and password in that order.
///
/// The first blank answer ends the dialogue with [`CredentialError::Empty`];
/// the remaining questions are not asked.
pub fn prompt_credentials<P>(prompt: &mut P) -> Result<Credentials, CredentialError>
where
    P: CredentialPrompt + ?Sized,
{
    let broker = answer(prompt.read_value(Field::Broker)?, Field::Broker)?;
    let username = answer(prompt.read_value(Field::Username)?, Field::Username)?;
    let password = answer(prompt.read_secret(Field::Password)?, Field::Password)?;

    debug!(broker = %broker, username = %username, "Credentials entered");
    Credentials::from_answers(broker, username, password)
}

fn answer(value: String, field: Field) -> Result<String, CredentialError> {
    if value.trim().is_empty() {
        return Err(CredentialError::Empty(field));
    }
    Ok(value)
}

//! Yes/no questions on the terminal.
use std::io::{BufRead, Write};

use anyhow::{Context as _, Result};

/// Asked when no managed target is linked yet.
pub const NEW_HOST_QUESTION: &str = "No previous installation detected. Do you want to run full new host setup? \
     (Install base packages, terminal fonts, starship, git config) [y/N]: ";

/// Asked on new hosts that have a graphical environment.
pub const UI_QUESTION: &str = "UI environment detected. Install additional desktop/UI packages \
     (e.g. flameshot, guake)? [y/N]: ";

/// Something that can answer a yes/no question.
pub trait Confirm {
    /// Ask `question` and return the answer; anything but yes is no.
    ///
    /// # Errors
    ///
    /// Returns an error if the question cannot be written or the answer read.
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Reads answers from `input`, writing questions to `output`.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a prompter over the given streams.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl Prompter<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompter bound to the process terminal.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for Prompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{question}").context("writing prompt")?;
        self.output.flush().context("flushing prompt")?;

        let mut answer = String::new();
        let read = self
            .input
            .read_line(&mut answer)
            .context("reading answer")?;
        if read == 0 {
            // EOF: nobody is there to answer.
            writeln!(self.output).context("writing prompt")?;
            return Ok(false);
        }
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
